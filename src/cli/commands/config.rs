//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, mut settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            set_key(&mut settings, key, value)?;
            settings.save()?;
            Output::success(&format!("Set {} = {}", key, value));
        }

        ConfigAction::Edit => {
            let config_path = Settings::default_config_path();

            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save()?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            // Try to open in editor
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Apply a dotted-key assignment to the settings.
fn set_key(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "general.log_level" => settings.general.log_level = value.to_string(),
        "embedding.model" => settings.embedding.model = value.to_string(),
        "embedding.dimensions" => settings.embedding.dimensions = value.parse()?,
        "expansion.enabled" => settings.expansion.enabled = value.parse()?,
        "expansion.model" => settings.expansion.model = value.to_string(),
        "expansion.variations" => settings.expansion.variations = value.parse()?,
        "chunking.window_size" => settings.chunking.window_size = value.parse()?,
        "vector_store.provider" => settings.vector_store.provider = value.to_string(),
        "vector_store.url" => settings.vector_store.url = value.to_string(),
        "search.max_results" => settings.search.max_results = value.parse()?,
        "search.cold_start_threshold" => settings.search.cold_start_threshold = value.parse()?,
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown or unsupported config key: {}",
                key
            ))
        }
    }
    Ok(())
}
