//! rbackup: concurrent, rsync-driven directory backups.
//!
//! This crate provides the configuration model, path safety rules, rsync command construction
//! and the worker pool that mirrors every configured item into the backup root.

pub mod command;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod item;
pub mod path;
pub mod sysexits;

pub use config::Config;
pub use error::{ConfigError, ItemError, Outcome};
pub use executor::{Executor, RunOptions};
pub use item::Item;
