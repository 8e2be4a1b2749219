use crate::output::{print_document, print_json};
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use pkgrev_core::config::{ControllerConfig, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective config (file values over defaults)
    Show,

    /// Check the config for out-of-range values
    Validate,
}

pub fn run(config_path: Option<&Path>, subcommand: ConfigSubcommand, json: bool) -> Result<()> {
    let config = load(config_path)?;
    match subcommand {
        ConfigSubcommand::Show => print_document(&config, json),
        ConfigSubcommand::Validate => validate(&config, json),
    }
}

pub fn load(config_path: Option<&Path>) -> Result<ControllerConfig> {
    ControllerConfig::load_or_default(config_path).with_context(|| match config_path {
        Some(p) => format!("failed to load config from {}", p.display()),
        None => "failed to load default config".to_string(),
    })
}

/// Log warnings and fail on errors, before a command starts working.
pub fn check(config: &ControllerConfig) -> Result<()> {
    let mut errors = Vec::new();
    for w in config.validate() {
        match w.level {
            WarnLevel::Warning => tracing::warn!("config: {}", w.message),
            WarnLevel::Error => errors.push(w.message),
        }
    }
    if !errors.is_empty() {
        bail!("invalid config: {}", errors.join("; "));
    }
    Ok(())
}

fn validate(config: &ControllerConfig, json: bool) -> Result<()> {
    let warnings = config.validate();
    if json {
        print_json(&warnings)?;
    } else if warnings.is_empty() {
        println!("config ok");
    } else {
        for w in &warnings {
            let label = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("{label}: {}", w.message);
        }
    }
    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        bail!("config has errors");
    }
    Ok(())
}
