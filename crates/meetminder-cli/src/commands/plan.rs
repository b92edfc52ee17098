use std::path::PathBuf;

use clap::Args;
use meetminder_core::{plan, Clock, PendingAlert, Result, SystemClock};

#[derive(Args)]
pub struct PlanArgs {
    /// Events JSON file
    #[arg(long)]
    pub events: PathBuf,
    /// Preferences TOML file
    #[arg(long)]
    pub prefs: Option<PathBuf>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: PlanArgs) -> Result<()> {
    let events = super::load_events(&args.events)?;
    let prefs = super::load_prefs(args.prefs.as_deref())?;
    let now = SystemClock.now();

    let mut alerts: Vec<PendingAlert> = Vec::new();
    for event in &events {
        match plan(event, &prefs, now) {
            Ok(planned) => alerts.extend(planned),
            Err(e) => eprintln!("skipping event '{}': {e}", event.id),
        }
    }
    alerts.sort_by_key(|a| a.trigger_at);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&alerts)?);
        return Ok(());
    }

    if alerts.is_empty() {
        println!("No upcoming alerts.");
        return Ok(());
    }
    for alert in &alerts {
        let in_secs = (alert.trigger_at - now).num_seconds();
        println!(
            "{}  {:>6}s  {:?}",
            alert.event_id, in_secs, alert.kind
        );
    }
    Ok(())
}
