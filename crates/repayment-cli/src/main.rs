mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::allocation::AllocateArgs;
use commands::process::ProcessArgs;
use commands::reconcile::ReconcileArgs;
use commands::status::PaidStatusArgs;

/// Repayment allocation and loan status tooling
#[derive(Parser)]
#[command(
    name = "repay",
    version,
    about = "Repayment allocation and loan status tooling",
    long_about = "Allocates incoming repayments across instalments (late fee, then \
                  interest, then principal), replays repayment batches against a \
                  ledger snapshot and reconciles loan status updates."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML file with payment flow settings
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the component waterfall over a set of instalments
    Allocate(AllocateArgs),
    /// Resolve the paid-off sub-status for a due date and payment date
    PaidStatus(PaidStatusArgs),
    /// Replay repayment transactions against a ledger snapshot
    Process(ProcessArgs),
    /// Apply a batch of loan status updates
    Reconcile(ReconcileArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match input::config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(2);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Allocate(args) => commands::allocation::run_allocate(args),
        Commands::PaidStatus(args) => commands::status::run_paid_status(args, &config),
        Commands::Process(args) => commands::process::run_process(args, cli.config.is_some().then_some(config)),
        Commands::Reconcile(args) => commands::reconcile::run_reconcile(args),
        Commands::Version => {
            println!("repay {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
