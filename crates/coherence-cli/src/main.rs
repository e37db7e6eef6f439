use clap::{Parser, Subcommand};
use coherence_core::Period;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "coherence-cli", version, about = "Coherence breathing practice CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a guided breathing session, printing events as JSON lines
    Breathe(commands::breathe::BreatheArgs),
    /// Record a session that was timed elsewhere
    Record(commands::sessions::RecordArgs),
    /// List sessions, most recent first
    Sessions {
        /// today, week, month or all
        #[arg(default_value = "week")]
        period: Period,
    },
    /// Aggregate statistics for a period
    Stats {
        /// today, week, month or all
        #[arg(default_value = "week")]
        period: Period,
    },
    /// Today/this week at a glance
    Summary,
    /// Consistency, accuracy trend and practice patterns
    Analyze {
        /// today, week, month or all
        #[arg(default_value = "all")]
        period: Period,
    },
    /// Export the session log as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<std::path::PathBuf>,
    },
    /// Replace the session log with an exported file
    Import {
        path: std::path::PathBuf,
    },
    /// Delete sessions older than a number of days
    Cleanup {
        #[arg(long, default_value = "30")]
        days: u32,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("COHERENCE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Breathe(args) => commands::breathe::run(args),
        Commands::Record(args) => commands::sessions::record(args),
        Commands::Sessions { period } => commands::sessions::list(period),
        Commands::Stats { period } => commands::stats::statistics(period),
        Commands::Summary => commands::stats::summary(),
        Commands::Analyze { period } => commands::stats::analyze(period),
        Commands::Export { output } => commands::sessions::export(output.as_deref()),
        Commands::Import { path } => commands::sessions::import(&path),
        Commands::Cleanup { days } => commands::sessions::cleanup(days),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
