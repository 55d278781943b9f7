mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, drop, repair, CheckArgs, DropArgs, RepairArgs};

/// Scenekit CLI - reference checks and structural edits on scene documents
#[derive(Parser, Debug)]
#[command(name = "scenekit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report aliases that do not resolve
    Check(CheckArgs),

    /// Repair every alias of a document
    Repair(RepairArgs),

    /// Move objects onto a grid cell
    Drop(DropArgs),
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check(args) => check(args),
        Command::Repair(args) => repair(args),
        Command::Drop(args) => drop(args),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
