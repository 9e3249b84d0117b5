use anyhow::Context;
use clap::Subcommand;
use runway_core::config::{Config, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the resolved configuration
    Show,
    /// Check the configuration for problems
    Validate,
}

pub fn run(config_path: Option<&Path>, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<i32> {
    let config = Config::resolve(config_path).context("failed to load config")?;

    match subcmd {
        ConfigSubcommand::Show => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", serde_yaml::to_string(&config)?);
            }
            Ok(0)
        }
        ConfigSubcommand::Validate => {
            let warnings = config.validate();

            if json {
                println!("{}", serde_json::to_string_pretty(&warnings)?);
            } else if warnings.is_empty() {
                println!("Configuration OK.");
            } else {
                for w in &warnings {
                    let level = match w.level {
                        WarnLevel::Warning => "warning",
                        WarnLevel::Error => "error",
                    };
                    println!("{level:>7}  {}", w.message);
                }
            }

            let has_error = warnings.iter().any(|w| w.level == WarnLevel::Error);
            Ok(if has_error { 1 } else { 0 })
        }
    }
}
