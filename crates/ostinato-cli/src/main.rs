//! Ostinato CLI - inspect drivers and replay topologies against the runtime.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ostinato")]
#[command(author, version, about = "Ostinato audio DSP runtime CLI", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in component drivers
    Drivers(commands::drivers::DriversArgs),

    /// Check a topology file without running it
    Validate(commands::validate::ValidateArgs),

    /// Replay a topology and print the resulting graph
    Load(commands::load::LoadArgs),

    /// Replay a topology, schedule its pipelines and drive the clock
    Tick(commands::tick::TickArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Drivers(args) => commands::drivers::run(args),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Load(args) => commands::load::run(args),
        Commands::Tick(args) => commands::tick::run(args),
    }
}
