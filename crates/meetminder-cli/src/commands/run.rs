use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use meetminder_core::{Clock, OverlayView, Presenter, Result, Scheduler, SystemClock};
use tracing::info;

#[derive(Args)]
pub struct RunArgs {
    /// Events JSON file
    #[arg(long)]
    pub events: PathBuf,
    /// Preferences TOML file
    #[arg(long)]
    pub prefs: Option<PathBuf>,
}

/// Presenter that renders the overlay as terminal output. Stands in for
/// the GUI shell; the countdown stream is drained on its own task so
/// `show` returns immediately.
struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn show(&self, view: OverlayView) {
        let title = view.event.title.clone();
        println!(
            "\n=== {} {} (lead {}m) ===",
            if view.from_snooze { "SNOOZED ALERT" } else { "ALERT" },
            title,
            view.lead_minutes
        );
        if let Some(link) = view.event.primary_link() {
            println!("    join: {link}");
        }
        let mut countdown = view.countdown;
        tokio::spawn(async move {
            while countdown.changed().await.is_ok() {
                let secs = *countdown.borrow_and_update();
                if secs >= 0 && secs % 30 == 0 {
                    println!("    {title} starts in {secs}s");
                }
            }
        });
    }

    fn hide(&self) {
        println!("=== overlay hidden ===");
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let events = super::load_events(&args.events)?;
    let prefs = super::load_prefs(args.prefs.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let scheduler = Scheduler::spawn(
            Arc::new(TerminalPresenter),
            Arc::new(SystemClock) as Arc<dyn Clock>,
        );
        scheduler.start(events, prefs)?;
        info!("scheduler running, press Ctrl-C to exit");

        tokio::signal::ctrl_c().await?;
        scheduler.shutdown()?;
        Ok(())
    })
}
