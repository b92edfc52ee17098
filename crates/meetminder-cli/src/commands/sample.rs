use std::path::PathBuf;

use chrono::{Duration, Utc};
use clap::Args;
use meetminder_core::{MeetingEvent, Provider, Result};
use uuid::Uuid;

#[derive(Args)]
pub struct SampleArgs {
    /// Number of events to generate
    #[arg(long, default_value = "3")]
    pub count: usize,
    /// Write to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: SampleArgs) -> Result<()> {
    let now = Utc::now();
    let events: Vec<MeetingEvent> = (0..args.count)
        .map(|i| {
            let start = now + Duration::minutes(6 + 30 * i as i64);
            MeetingEvent {
                id: Uuid::new_v4().to_string(),
                title: format!("Sample meeting {}", i + 1),
                start_time: start,
                end_time: start + Duration::minutes(30),
                links: vec![format!("https://meet.example/{}", i + 1)],
                provider: Some(Provider::Other),
            }
        })
        .collect();

    let json = serde_json::to_string_pretty(&events)?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("Wrote {} events to {}", events.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
