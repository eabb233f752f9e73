//! Configuration for a backup run.
//!
//! This module decodes the TOML configuration document, validates it and normalizes it into
//! an immutable [`Config`] that is handed to every other component. It also knows where the
//! configuration file lives when none is given on the command line.

use crate::constants::{CONFIG_NAME, PKG_NAME, SYSTEM_CONFIG_DIR};
use crate::error::ConfigError;
use crate::item::Item;
use crate::path;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

/// The configuration document exactly as written on disk.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RawConfig {
    /// Directory under which every item gets its own destination.
    #[serde(default)]
    pub backup_root: String,
    #[serde(default)]
    pub rsync: RsyncSection,
    /// Worker count. Absent, zero or negative means "pick from available parallelism".
    #[serde(default)]
    pub jobs: Option<i64>,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// The `[rsync]` table.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RsyncSection {
    /// Extra flags passed to rsync verbatim, in order.
    #[serde(default)]
    pub options: Vec<String>,
    /// Patterns passed to rsync as `--exclude <pattern>`.
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// Validated configuration. Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Absolute backup root; never the filesystem root.
    pub backup_root: PathBuf,
    pub transfer_options: Vec<String>,
    /// Trimmed, non-empty and unique, in first-occurrence order.
    pub exclude_patterns: Vec<String>,
    /// Number of concurrent workers, at least 1.
    pub worker_count: usize,
    /// Never empty.
    pub items: Vec<Item>,
}

impl Config {
    /// Reads, decodes and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&toml_str).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_raw(raw)
    }

    /// Validates `raw`, defaulting the worker count from this machine's parallelism.
    pub fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        Self::from_raw_with_parallelism(raw, available_parallelism())
    }

    /// Validates `raw` as [`Config::from_raw`] does, against an explicit parallelism value.
    pub fn from_raw_with_parallelism(
        raw: RawConfig,
        parallelism: usize,
    ) -> Result<Self, ConfigError> {
        let root = raw.backup_root.trim();
        if root.is_empty() {
            return Err(ConfigError::MissingBackupRoot);
        }
        let backup_root = path::safe_path(root).map_err(ConfigError::UnsafeBackupRoot)?;

        if raw.items.is_empty() {
            return Err(ConfigError::NoItems);
        }
        if let Some(index) = raw
            .items
            .iter()
            .position(|item| item.source.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyItemPath(index + 1));
        }
        check_destinations(&backup_root, &raw.items)?;

        Ok(Self {
            backup_root,
            transfer_options: raw.rsync.options,
            exclude_patterns: normalize_excludes(raw.rsync.excludes),
            worker_count: worker_count(raw.jobs, parallelism),
            items: raw.items,
        })
    }
}

/// Rejects two items that would mirror into the same directory under `backup_root`.
///
/// Items whose source or destination name cannot be resolved are skipped here; the executor
/// reports those per item.
fn check_destinations(backup_root: &Path, items: &[Item]) -> Result<(), ConfigError> {
    let mut seen: HashMap<PathBuf, usize> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        let Ok(source) = path::safe_path(&item.source) else {
            continue;
        };
        let Ok(dest) = item.dest_name_for(&source) else {
            continue;
        };
        let target = backup_root.join(dest);
        if let Some(&first) = seen.get(&target) {
            return Err(ConfigError::DuplicateDestination {
                path: target,
                first,
                second: index + 1,
            });
        }
        seen.insert(target, index + 1);
    }
    Ok(())
}

/// Trims every pattern, drops empty ones and removes duplicates, keeping the first occurrence.
///
/// Idempotent: normalizing an already normalized list returns it unchanged.
pub fn normalize_excludes<I, S>(patterns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    patterns
        .into_iter()
        .filter_map(|p| {
            let p = p.as_ref().trim();
            (!p.is_empty() && seen.insert(p.to_string())).then(|| p.to_string())
        })
        .collect()
}

/// Effective worker count: `jobs` when positive, otherwise half the parallelism (at least 1).
pub fn worker_count(jobs: Option<i64>, parallelism: usize) -> usize {
    match jobs {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
        _ => (parallelism / 2).max(1),
    }
}

/// Number of threads this machine can run in parallel, or 1 if unknown.
pub fn available_parallelism() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Returns the per-user configuration file path, if a config directory is known.
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_NAME))
}

/// Returns the system-wide configuration file path.
pub fn system_config_file() -> PathBuf {
    Path::new(SYSTEM_CONFIG_DIR).join(PKG_NAME).join(CONFIG_NAME)
}

/// Picks the configuration file to load.
///
/// An explicit path wins and is returned as is. Otherwise the per-user file, then the
/// system-wide one, are tried in that order.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let candidates: Vec<PathBuf> = config_file()
        .into_iter()
        .chain([system_config_file()])
        .collect();
    find_first_file(candidates)
}

/// Returns the first candidate that is an existing file.
pub fn find_first_file(candidates: Vec<PathBuf>) -> Result<PathBuf, ConfigError> {
    match candidates.iter().find(|p| p.is_file()) {
        Some(found) => Ok(found.clone()),
        None => Err(ConfigError::NotFound(candidates)),
    }
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(not(target_os = "macos"))]
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(PKG_NAME))
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(target_os = "macos")]
fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join(PKG_NAME))
}
