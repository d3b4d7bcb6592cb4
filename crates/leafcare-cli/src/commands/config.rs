//! Config command handlers

use anyhow::Result;

use leafcare_core::Config;

use crate::output::{Output, OutputFormat};

/// Show the effective configuration
///
/// The token secret is never printed.
pub fn show(config: &Config, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "token_ttl_minutes": config.token_ttl_minutes,
                    "log_level": config.log_level,
                    "default_secret": config.uses_default_secret()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:          {}", config.data_dir.display());
            println!("  token_ttl_minutes: {}", config.token_ttl_minutes);
            println!(
                "  log_level:         {}",
                config.log_level.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  token_secret:      {}",
                if config.uses_default_secret() {
                    "(built-in development secret)"
                } else {
                    "(set)"
                }
            );
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}
