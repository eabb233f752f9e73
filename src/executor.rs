//! Runs the transfer for a single backup item.

use crate::command::{self, CommandSpec};
use crate::config::Config;
use crate::constants::TRANSFER_TOOL;
use crate::error::ItemError;
use crate::item::Item;
use crate::path;
use futures::FutureExt;
use futures::future::BoxFuture;
use log::{debug, info, warn};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tokio::time;

/// Per-run switches that come from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Pass `--dry-run` to the transfer tool.
    pub dry_run: bool,
    pub verbose: bool,
    /// Deadline for each item's transfer.
    pub timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            timeout: Duration::from_secs(60 * 60),
        }
    }
}

/// Transfers one item. The dispatcher is generic over this so workers can be driven by
/// something other than a real rsync process.
pub trait Transfer: Send + Sync + 'static {
    fn transfer<'a>(&'a self, item: &'a Item) -> BoxFuture<'a, Result<(), ItemError>>;
}

/// Executes items with the external transfer tool.
#[derive(Debug, Clone)]
pub struct Executor {
    program: OsString,
    backup_root: PathBuf,
    options: Vec<String>,
    excludes: Vec<String>,
    run: RunOptions,
}

impl Executor {
    /// Creates an executor for `config` that runs `rsync` from `PATH`.
    pub fn new(config: &Config, run: RunOptions) -> Self {
        Self {
            program: TRANSFER_TOOL.into(),
            backup_root: config.backup_root.clone(),
            options: config.transfer_options.clone(),
            excludes: config.exclude_patterns.clone(),
            run,
        }
    }

    /// Runs `program` instead of `rsync`, e.g. the absolute path found on `PATH`.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Validates `item`'s paths, prepares its destination and mirrors it under the deadline.
    ///
    /// # Errors
    /// Every failure is returned as an [`ItemError`]; this never panics.
    pub async fn execute(&self, item: &Item) -> Result<(), ItemError> {
        let source = path::safe_path(&item.source)?;
        fs::metadata(&source)
            .await
            .map_err(|e| ItemError::SourceMissing {
                path: source.clone(),
                source: e,
            })?;

        let dest_name = item
            .dest_name_for(&source)
            .map_err(|e| ItemError::DestinationUnavailable {
                path: self.backup_root.clone(),
                source: e,
            })?;
        let destination = self.backup_root.join(&dest_name);
        fs::create_dir_all(&destination)
            .await
            .map_err(|e| ItemError::DestinationUnavailable {
                path: destination.clone(),
                source: e,
            })?;

        let args = command::build_args(&CommandSpec {
            source: &source,
            backup_root: &self.backup_root,
            dest_name: &dest_name,
            options: &self.options,
            excludes: &self.excludes,
            dry_run: self.run.dry_run,
            verbose: self.run.verbose,
        });
        if self.run.verbose || self.run.dry_run {
            info!("{}", command::shell_join(&self.program, &args));
        }
        self.run_tool(&args).await
    }

    async fn run_tool(&self, args: &[OsString]) -> Result<(), ItemError> {
        let program = self.program.to_string_lossy().into_owned();
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ItemError::ExecutionFailed {
                program: program.clone(),
                code: None,
                detail: format!("cannot start: {e}"),
            })?;
        debug!("started {program} (pid {:?})", child.id());

        match time::timeout(self.run.timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(ItemError::ExecutionFailed {
                program,
                code: status.code(),
                detail: format!("exited with {status}"),
            }),
            Ok(Err(e)) => Err(ItemError::ExecutionFailed {
                program,
                code: None,
                detail: format!("cannot wait for the process: {e}"),
            }),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("failed to kill {program} after timeout: {e}");
                }
                Err(ItemError::Timeout(self.run.timeout))
            }
        }
    }
}

impl Transfer for Executor {
    fn transfer<'a>(&'a self, item: &'a Item) -> BoxFuture<'a, Result<(), ItemError>> {
        self.execute(item).boxed()
    }
}
