//! # Dupix - Concurrent Duplicate Image Discovery
//!
//! Dupix walks a directory tree with a pool of discovery workers, fingerprints
//! every image with a perceptual hash plus a content hash, and removes
//! byte-identical duplicates on the spot. Visually-identical files that differ
//! in bytes are queued for an interactive review, one pair at a time.
//!
//! ## Features
//!
//! - **Two-tier identity**: perceptual hashing finds look-alikes, content
//!   hashing separates true copies from near-misses
//! - **Parallel discovery**: worker pool sized to available cores, with a
//!   shared directory frontier and a linearizable identity map
//! - **Human-in-the-loop**: ambiguous pairs are resolved by the operator,
//!   never silently
//! - **Safe deletion**: map entries only move once the old file is gone, and
//!   an optional tree backup runs before anything is touched
//!
//! ## Quick Start
//!
//! ```bash
//! # Install dupix
//! cargo install dupix
//!
//! # Review duplicates under a photo library
//! dupix scan ~/Pictures
//!
//! # Non-interactive run that keeps everything ambiguous
//! dupix scan ~/Pictures --review keep-both
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod hash;

pub use cli::{Cli, Output};
pub use config::DupixConfig;
pub use engine::{Engine, EngineConfig, EngineError, ScanReport};

/// Result type alias for dupix operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
