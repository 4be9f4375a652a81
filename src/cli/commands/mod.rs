//! Command implementations for the dupix CLI
//!
//! This module contains the actual implementations for each CLI command.
//! Each command is organized into its own module for better maintainability.

pub mod config;
pub mod scan;
