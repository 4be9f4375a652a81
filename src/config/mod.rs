//! Configuration management for Dupix
//!
//! Layered loading: embedded defaults, then `dupix.toml` / `dupix.json` in the
//! working directory, then `DUPIX_*` environment variables.

mod core;

pub use self::core::{BackupConfig, DupixConfig, LoggingConfig, ScanConfig, SUPPORTED_EXTENSIONS};
