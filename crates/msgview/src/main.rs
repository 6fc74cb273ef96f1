//! msgview CLI - message document renderer.
//!
//! Provides commands for:
//! - `render`: Render a document as HTML, terminal text, AST or view tree
//! - `targets`: List activation targets and route one through the callbacks
//! - `stylesheet`: Print the CSS for a theme

mod commands;
mod error;
mod output;
mod terminal;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{RenderArgs, StylesheetArgs, TargetsArgs};
use output::Output;

/// msgview - message document renderer.
#[derive(Parser)]
#[command(name = "msgview", version, about)]
struct Cli {
    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a document.
    Render(RenderArgs),
    /// List activation targets in a document.
    Targets(TargetsArgs),
    /// Print the stylesheet for a theme.
    Stylesheet(StylesheetArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(&output),
        Commands::Targets(args) => args.execute(&output),
        Commands::Stylesheet(args) => args.execute(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
