//! Configuration command implementations
//!
//! Commands for inspecting and validating the merged dupix configuration.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use crate::cli::Output;
use crate::config::DupixConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format: toml, json
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Validate configuration file
    Validate,
}

pub fn execute(args: ConfigArgs, config: &DupixConfig, output: &Output) -> Result<()> {
    match args.command {
        ConfigCommand::Show { format } => {
            let rendered = match format.to_lowercase().as_str() {
                "toml" => toml::to_string_pretty(config)?,
                "json" => serde_json::to_string_pretty(config)?,
                _ => bail!("Unsupported format: {}. Use toml or json", format),
            };
            println!("{rendered}");
        }
        ConfigCommand::Validate => match config.validate() {
            Ok(()) => output.success("configuration is valid"),
            Err(err) => {
                output.error(&format!("{err:#}"));
                bail!("configuration is invalid");
            }
        },
    }

    Ok(())
}
