use std::path::PathBuf;

use clap::Subcommand;
use meetminder_core::{CoreError, PreferencesSnapshot, Result};

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print effective preferences (file merged over defaults) as TOML
    Show {
        /// Preferences TOML file
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Write a default preferences file
    Init {
        /// Destination path
        #[arg(long)]
        path: PathBuf,
    },
}

pub fn run(action: PrefsAction) -> Result<()> {
    match action {
        PrefsAction::Show { path } => {
            let prefs = super::load_prefs(path.as_deref())?;
            print!("{}", encode(&prefs)?);
            Ok(())
        }
        PrefsAction::Init { path } => {
            if path.exists() {
                return Err(CoreError::Custom(format!(
                    "refusing to overwrite {}",
                    path.display()
                )));
            }
            std::fs::write(&path, encode(&PreferencesSnapshot::default())?)?;
            println!("Preferences written to {}", path.display());
            Ok(())
        }
    }
}

fn encode(prefs: &PreferencesSnapshot) -> Result<String> {
    toml::to_string_pretty(prefs)
        .map_err(|e| CoreError::Custom(format!("cannot encode preferences: {e}")))
}
