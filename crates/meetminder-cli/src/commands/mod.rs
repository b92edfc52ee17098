pub mod plan;
pub mod prefs;
pub mod run;
pub mod sample;

use std::path::Path;

use meetminder_core::{CoreError, MeetingEvent, PreferencesSnapshot, Result};

/// Load a JSON events file (the calendar-sync collaborator's output).
pub fn load_events(path: &Path) -> Result<Vec<MeetingEvent>> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        CoreError::Custom(format!("cannot read events file {}: {e}", path.display()))
    })?;
    let events: Vec<MeetingEvent> = serde_json::from_str(&json)?;
    Ok(events)
}

/// Load preferences from a TOML file; a missing file yields defaults.
pub fn load_prefs(path: Option<&Path>) -> Result<PreferencesSnapshot> {
    let Some(path) = path else {
        return Ok(PreferencesSnapshot::default());
    };
    match std::fs::read_to_string(path) {
        Ok(text) => toml::from_str(&text).map_err(|e| {
            CoreError::Custom(format!("cannot parse preferences {}: {e}", path.display()))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(PreferencesSnapshot::default())
        }
        Err(e) => Err(CoreError::Custom(format!(
            "cannot read preferences {}: {e}",
            path.display()
        ))),
    }
}
