//! Apollon CLI - a static library cache for CocoaPods targets

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use apollon::util::{Shell, Verbosity};
use apollon::ApollonError;

mod cli;
mod commands;

use cli::{Action, Cli};

fn main() {
    if let Err(e) = run() {
        if let Some(err) = e.downcast_ref::<ApollonError>() {
            for line in err.transition_lines() {
                eprintln!("{}", line);
            }
        }
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ if cli.verbose => EnvFilter::new("apollon=debug"),
        _ => EnvFilter::new("apollon=info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let shell = Shell::new(if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    // Execute action
    match cli.action() {
        Action::Cache => commands::cache::execute(&shell),
        Action::SyncBack => commands::sync_back::execute(&shell),
        Action::Setup => commands::setup::execute(&shell),
        Action::Remove => commands::remove::execute(&shell),
        Action::Clean => commands::clean::execute(&shell),
        Action::CleanOld => commands::clean_old::execute(&shell),
        Action::Install => commands::install::execute(&shell),
    }
}
