//! Command implementations.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::io::Write;

/// Run the reset command: drop and recreate both vector collections.
pub async fn run_reset(yes: bool, settings: Settings) -> Result<()> {
    if !yes {
        Output::warning("This deletes ALL indexed transcripts and recorded doubts.");
        print!("Continue? (yes/no): ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "yes" {
            Output::info("Aborted.");
            return Ok(());
        }
    }

    let orchestrator = Orchestrator::new(settings).await?;
    orchestrator.reset().await?;

    Output::success("Vector store reset.");
    Ok(())
}

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}
