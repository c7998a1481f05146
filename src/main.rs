use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

mod app;
mod checkpoint;
mod cluster;
mod config;
mod corpus;
mod db;
mod error;
mod models;
mod report;

use app::{App, Command};
use config::Preferences;
use error::Result;

/// Groups academic paper keywords by meaning and tracks them over the years.
#[derive(Debug, Parser)]
#[command(name = "keyword-trends", version)]
struct Args {
    /// Preferences file (defaults to the user config directory)
    #[arg(long, global = true)]
    preferences: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    }
}

fn run(args: Args) -> Result<()> {
    let prefs_path = args.preferences.unwrap_or_else(Preferences::default_path);
    let prefs = Preferences::load(&prefs_path)?;

    let mut app = App::new(prefs, prefs_path);
    app.handle_command(args.command)
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level(args.verbose).into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
