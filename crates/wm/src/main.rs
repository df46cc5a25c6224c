//! wikimark CLI - wiki markup to sanitized HTML.
//!
//! Provides commands for:
//! - `convert`: Convert a markup file to HTML
//! - `check-policy`: Validate the configuration and show the effective policy

mod commands;
mod error;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckPolicyArgs, ConvertArgs};
use output::Output;

/// wikimark - wiki markup to sanitized HTML.
#[derive(Parser)]
#[command(name = "wm", version, about)]
struct Cli {
    /// Enable verbose output (decision logging).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a markup file to HTML on stdout.
    Convert(ConvertArgs),
    /// Validate the configuration and print the effective policy.
    CheckPolicy(CheckPolicyArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::stderr();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert(args) => args.execute(),
        Commands::CheckPolicy(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
