use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "meetminder-cli", version, about = "MeetMinder CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the planned alerts for an events file
    Plan {
        #[command(flatten)]
        args: commands::plan::PlanArgs,
    },
    /// Run the scheduler with a terminal presenter until Ctrl-C
    Run {
        #[command(flatten)]
        args: commands::run::RunArgs,
    },
    /// Timing preferences management
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Generate a sample events file
    Sample {
        #[command(flatten)]
        args: commands::sample::SampleArgs,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Plan { args } => commands::plan::run(args),
        Commands::Run { args } => commands::run::run(args),
        Commands::Prefs { action } => commands::prefs::run(action),
        Commands::Sample { args } => commands::sample::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
