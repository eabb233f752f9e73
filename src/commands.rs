//! Command-line interface definition for rbackup.
//!
//! This module defines the CLI commands and their handlers: running the backup, showing the
//! resolved configuration and printing the configuration file location.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use rbackup::constants::TRANSFER_TOOL;
use rbackup::dispatch::{self, Report};
use rbackup::{Config, Executor, RunOptions, config, sysexits};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder;

/// Command-line interface definition for rbackup.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub commands: Option<Commands>,
}

/// Supported rbackup commands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Mirror every configured item into the backup root.
    Run {
        /// Configuration file. Defaults to the user, then the system configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Show what rsync would transfer without changing anything.
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// Print every rsync command and pass -v to rsync.
        #[arg(short, long)]
        verbose: bool,
        /// Deadline for each item, e.g. 90, 30s, 10m, 2h or 1d.
        #[arg(short, long, default_value = "1h", value_parser = parse_duration)]
        timeout: Duration,
    },
    /// Show the resolved configuration and the destination of every item.
    Status {
        /// Configuration file. Defaults to the user, then the system configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Display the absolute path of the configuration file.
    Config,
}

/// Runs every configured item and logs a summary.
///
/// Fatal problems (configuration, missing rsync) exit the process before any item starts.
/// Failed items are logged but do not change the exit status.
pub(crate) fn run(config_path: Option<&Path>, options: RunOptions) -> Result<()> {
    let config = load_config(config_path);
    let program = which::which(TRANSFER_TOOL).unwrap_or_else(|e| {
        error!("{TRANSFER_TOOL} is required but was not found on PATH: {e}");
        process::exit(sysexits::EX_UNAVAILABLE);
    });
    if options.dry_run {
        info!("dry run: rsync will not change any files");
    }

    let workers = config.worker_count;
    let items = config.items.clone();
    let executor = Arc::new(Executor::new(&config, options).with_program(program));

    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let reports = rt.block_on(dispatch::dispatch(items, workers, executor));

    log_summary(&reports);
    Ok(())
}

/// Prints the resolved configuration.
pub(crate) fn status(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    println!("{}", display_config(&config));
    Ok(())
}

/// Prints the absolute path to the configuration file.
pub(crate) fn config() -> Result<()> {
    let file = config::config_file()
        .ok_or_else(|| anyhow!("Couldn't determine the configuration directory"))?;
    println!("config file: {}", file.display());
    println!("system config file: {}", config::system_config_file().display());
    Ok(())
}

/// Locates and loads the configuration, exiting with a sysexits code on failure.
fn load_config(explicit: Option<&Path>) -> Config {
    config::locate(explicit)
        .and_then(|path| {
            info!("using configuration file {}", path.display());
            Config::load(&path)
        })
        .unwrap_or_else(|e| {
            error!("{e}");
            process::exit(e.exit_code());
        })
}

fn log_summary(reports: &[Report]) {
    let (succeeded, failed) = dispatch::summarize(reports);
    if failed == 0 {
        info!("{succeeded} item(s) succeeded");
    } else {
        warn!("{succeeded} item(s) succeeded, {failed} failed");
        for report in reports.iter().filter(|r| !r.is_success()) {
            warn!("  {}: {}", report.label, report.outcome());
        }
    }
}

fn display_config(config: &Config) -> String {
    let mut s = format!(
        "backup root: {}\nworkers: {}\n",
        config.backup_root.display(),
        config.worker_count
    );
    if !config.transfer_options.is_empty() {
        s.push_str(&format!("rsync options: {:?}\n", config.transfer_options));
    }
    if !config.exclude_patterns.is_empty() {
        s.push_str(&format!("excludes: {:?}\n", config.exclude_patterns));
    }
    s.push_str("items:");
    for item in &config.items {
        let dest = rbackup::path::safe_path(&item.source)
            .ok()
            .and_then(|source| item.dest_name_for(&source).ok())
            .map(|dest| config.backup_root.join(dest).display().to_string())
            .unwrap_or_else(|| "<invalid>".to_string());
        s.push_str(&format!(
            "\n  {}: {} -> {}",
            item.label(),
            item.source.display(),
            dest
        ));
    }
    s
}

/// Parses a duration such as `90`, `30s`, `10m`, `2h` or `1d`. A bare number means seconds.
pub(crate) fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let input = input.trim().to_lowercase();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);
    if number.is_empty() {
        return Err(format!("'{input}' must start with a number"));
    }
    let number: u64 = number
        .parse()
        .map_err(|e| format!("invalid number '{number}': {e}"))?;
    let factor = match unit.trim() {
        "" | "s" | "sec" | "secs" => 1,
        "m" | "min" | "mins" => 60,
        "h" | "hr" | "hrs" => 60 * 60,
        "d" | "day" | "days" => 24 * 60 * 60,
        other => return Err(format!("invalid unit '{other}', expected s, m, h or d")),
    };
    let secs = number
        .checked_mul(factor)
        .ok_or_else(|| format!("'{input}' is too large"))?;
    if secs == 0 {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(Duration::from_secs(secs))
}
