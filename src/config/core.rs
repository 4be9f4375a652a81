use anyhow::Result;
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::hash::HashConfig;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// File extensions eligible for hashing, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "gif", "tiff", "raw", "bmp", "webp", "svg",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DupixConfig {
    pub scan: ScanConfig,
    pub hash: HashConfig,
    pub backup: BackupConfig,
    pub logging: LoggingConfig,
}

/// Discovery pool and walk settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Worker count; 0 means available cores minus `reserved_cores`.
    pub workers: usize,
    pub reserved_cores: usize,
    /// Bounded-wait granularity for queue pops, in milliseconds.
    pub poll_interval_ms: u64,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            reserved_cores: 2,
            poll_interval_ms: 200,
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Copy the scan root to a `<root>_backup` sibling before deleting anything.
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset and no -v flags are given.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl DupixConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    pub fn load_with_custom_config(custom_config: Option<&str>) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG)); // Embedded defaults

        // If a custom config is specified, use only that + defaults + env vars.
        // The provider is picked by extension: a merged file that does not
        // parse fails the whole extraction, so the file must never run
        // through the other format's provider.
        if let Some(custom_path) = custom_config {
            figment = if Path::new(custom_path)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            {
                figment.merge(Json::file(custom_path))
            } else {
                figment.merge(Toml::file(custom_path))
            };
        } else {
            figment = figment
                .merge(Toml::file("dupix.toml"))
                .merge(Json::file("dupix.json"));
        }

        // Environment variables always have highest priority; sections are
        // separated with a double underscore (DUPIX_SCAN__WORKERS=4).
        figment = figment.merge(Env::prefixed("DUPIX_").split("__"));

        let config: DupixConfig = figment.extract()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.scan.poll_interval_ms == 0 {
            anyhow::bail!("scan.poll_interval_ms cannot be 0");
        }
        if self.scan.extensions.is_empty() {
            anyhow::bail!("scan.extensions cannot be empty");
        }
        if self.hash.size < 2 || self.hash.size > 32 {
            anyhow::bail!("hash.size must be between 2 and 32");
        }
        Ok(())
    }
}
