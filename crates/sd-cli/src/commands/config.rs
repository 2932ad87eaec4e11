//! Config command implementations

use std::path::Path;

use anyhow::{Context, Result};

use crate::context::AppContext;
use crate::output::{print_error, print_info, print_success, print_warning};
use sd_core::config::{self, AppConfig};

/// Show the effective configuration
pub fn config_show(ctx: &AppContext) -> Result<()> {
    if ctx.config_path.exists() {
        print_info(&format!("Configuration file: {:?}", ctx.config_path));
    } else {
        print_warning(&format!(
            "No configuration file found at {:?}, showing defaults",
            ctx.config_path
        ));
        print_info("Run 'serverdeck config init' to create one");
    }
    println!();

    let content =
        toml::to_string_pretty(&ctx.config).context("Failed to serialize configuration")?;
    println!("{}", content);
    Ok(())
}

/// Print the config file path
pub fn config_path(config_path: Option<&Path>) {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path);
    println!("{}", path.display());
}

/// Write a default configuration file
pub fn config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path);

    if config_file.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", config_file));
        print_info("Use --force to overwrite");
        anyhow::bail!("Config file already exists");
    }

    config::save_config(&config_file, &AppConfig::default())
        .with_context(|| format!("Failed to write config file: {:?}", config_file))?;

    print_success(&format!("Created configuration file: {:?}", config_file));
    Ok(())
}
