//! Error types for configuration loading and per-item execution.
//!
//! Errors come in two tiers. A [`ConfigError`] is fatal and stops the program before
//! any transfer starts. An [`ItemError`] belongs to a single backup item; it is
//! reported for that item and never affects the others.

use crate::sysexits;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a path was rejected by [`crate::path::safe_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnsafeReason {
    #[error("the current directory cannot be resolved")]
    Unresolvable,
    #[error("it resolves to the filesystem root")]
    FilesystemRoot,
}

/// A path that must not be handed to the transfer tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsafe path '{}': {reason}", .path.display())]
pub struct UnsafePath {
    /// The path as it was given.
    pub path: PathBuf,
    pub reason: UnsafeReason,
}

/// Fatal errors raised while locating, reading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration file found (searched: {})", SearchedPaths(.0))]
    NotFound(Vec<PathBuf>),
    #[error("failed to read configuration file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("`backup_root` is required")]
    MissingBackupRoot,
    #[error("at least one entry in `items` is required")]
    NoItems,
    #[error("item #{0} has an empty `path`")]
    EmptyItemPath(usize),
    #[error("invalid backup root: {0}")]
    UnsafeBackupRoot(#[source] UnsafePath),
    #[error("items #{first} and #{second} both mirror into '{}'", .path.display())]
    DuplicateDestination {
        path: PathBuf,
        first: usize,
        second: usize,
    },
}

impl ConfigError {
    /// Exit status the binary terminates with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::NotFound(_) | ConfigError::Read { .. } => sysexits::EX_NOINPUT,
            _ => sysexits::EX_CONFIG,
        }
    }
}

struct SearchedPaths<'a>(&'a [PathBuf]);

impl fmt::Display for SearchedPaths<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}

/// Failure of a single backup item.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    UnsafePath(#[from] UnsafePath),
    #[error("source '{}' is not accessible: {source}", .path.display())]
    SourceMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("destination '{}' is unavailable: {source}", .path.display())]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{program} failed: {detail}")]
    ExecutionFailed {
        program: String,
        /// Exit code of the tool, if it ran to completion.
        code: Option<i32>,
        detail: String,
    },
}

impl ItemError {
    /// Terminal state this error puts an item into.
    pub fn outcome(&self) -> Outcome {
        match self {
            ItemError::UnsafePath(_) => Outcome::UnsafePath,
            ItemError::SourceMissing { .. } => Outcome::SourceMissing,
            ItemError::DestinationUnavailable { .. } => Outcome::DestinationUnavailable,
            ItemError::Timeout(_) => Outcome::Timeout,
            ItemError::ExecutionFailed { .. } => Outcome::ExecutionFailed,
        }
    }
}

/// Terminal state of a backup item. Items are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Succeeded,
    SourceMissing,
    DestinationUnavailable,
    UnsafePath,
    Timeout,
    ExecutionFailed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Succeeded => "succeeded",
            Outcome::SourceMissing => "source missing",
            Outcome::DestinationUnavailable => "destination unavailable",
            Outcome::UnsafePath => "unsafe path",
            Outcome::Timeout => "timeout",
            Outcome::ExecutionFailed => "execution failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_searched_paths() {
        let err = ConfigError::NotFound(vec![
            PathBuf::from("/home/u/.config/rbackup/config.toml"),
            PathBuf::from("/etc/rbackup/config.toml"),
        ]);
        assert_eq!(
            err.to_string(),
            "no configuration file found (searched: /home/u/.config/rbackup/config.toml, /etc/rbackup/config.toml)"
        );
        assert_eq!(err.exit_code(), sysexits::EX_NOINPUT);
        assert_eq!(ConfigError::NoItems.exit_code(), sysexits::EX_CONFIG);
    }

    #[test]
    fn test_item_error_outcome() {
        let err = ItemError::from(UnsafePath {
            path: PathBuf::from("/"),
            reason: UnsafeReason::FilesystemRoot,
        });
        assert_eq!(err.outcome(), Outcome::UnsafePath);
        assert_eq!(
            err.to_string(),
            "unsafe path '/': it resolves to the filesystem root"
        );

        let err = ItemError::Timeout(Duration::from_secs(30));
        assert_eq!(err.outcome(), Outcome::Timeout);
        assert_eq!(err.to_string(), "timed out after 30s");
    }
}
