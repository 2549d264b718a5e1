//! `campus config` subcommands

use anyhow::{Context, Result};
use campus_config::{CampusConfig, ConfigLoader};
use std::path::Path;

pub fn validate(config_file: &Path) -> Result<()> {
    println!("🔍 Validating configuration file: {}", config_file.display());

    match ConfigLoader::new().from_file(config_file) {
        Ok(config) => {
            println!("✅ Configuration is valid");
            println!("   Database: {}", config.database.url);
            println!("   Log level: {}", config.logging.level);
            println!(
                "   Superuser bypass: {}",
                if config.rbac.allow_superuser_bypass { "enabled" } else { "disabled" }
            );
            Ok(())
        }
        Err(e) => {
            println!("❌ Configuration is invalid: {}", e);
            Err(e.into())
        }
    }
}

pub fn generate(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists, use --force to overwrite", output.display());
    }

    std::fs::write(output, CampusConfig::generate_sample())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("✅ Sample configuration written to {}", output.display());
    Ok(())
}

pub fn render(config: &CampusConfig, format: &str) -> Result<String> {
    match format {
        "yaml" => serde_yaml::to_string(config).context("Failed to serialize configuration as YAML"),
        "json" => serde_json::to_string_pretty(config).context("Failed to serialize configuration as JSON"),
        other => anyhow::bail!("Unsupported format '{}', use yaml or json", other),
    }
}

pub fn show(config: &CampusConfig, format: &str) -> Result<()> {
    println!("{}", render(config, format)?);
    Ok(())
}
