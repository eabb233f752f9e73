mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Cli, Commands};
use rbackup::{RunOptions, sysexits};
use std::process;

/// Entry point for the rbackup CLI application.
/// Parses command-line arguments and dispatches to the appropriate command handler.
fn main() -> Result<()> {
    let commands = match Cli::parse().commands {
        Some(commands) => commands,
        None => {
            eprintln!("rbk requires at least one command to execute. See 'rbk --help' for usage.");
            process::exit(sysexits::EX_USAGE);
        }
    };

    match commands {
        Commands::Run {
            config,
            dry_run,
            verbose,
            timeout,
        } => {
            init_logger(verbose);
            let options = RunOptions {
                dry_run,
                verbose,
                timeout,
            };
            commands::run(config.as_deref(), options)?;
        }
        Commands::Status { config } => {
            init_logger(false);
            commands::status(config.as_deref())?;
        }
        Commands::Config => {
            commands::config()?;
        }
    }
    Ok(())
}

/// Logs to stderr at `info`, or `debug` when verbose. `RUST_LOG` takes precedence.
fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .init();
}
