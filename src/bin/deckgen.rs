//! Deckgen CLI Binary
//!
//! Command-line interface for the deck asset registry.

use clap::Parser;
use deckgen::logging::init_logging;
use deckgen::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    // Create CLI context
    let context = match CliContext::new(cli.workspace.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing workspace: {}", e);
            process::exit(1);
        }
    };
    let context = if cli.no_backup {
        context.without_backups()
    } else {
        context
    };

    let logging = match cli.logging_config(&context.config().logging) {
        Ok(logging) => logging,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = init_logging(Some(&logging), Some(&cli.workspace)) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    // Execute command
    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
