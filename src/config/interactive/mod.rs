#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, LlmConfig};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("bakta-db configuration setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Database").bold().yellow());
    let db_path: String = Input::new()
        .with_prompt("SQLite database file")
        .default(config.database.path.display().to_string())
        .interact_text()?;
    config.database.path = db_path.into();

    eprintln!();
    eprintln!("{}", style("Question answering (ask)").bold().yellow());
    eprintln!("Configure the OpenAI-compatible endpoint used to turn questions into SQL.");
    eprintln!();

    configure_llm(&mut config.llm)?;

    if std::env::var(&config.llm.api_key_env).is_err() {
        eprintln!(
            "{}",
            style(format!(
                "Note: {} is not set in the current environment; `bakta-db ask` will fail until it is.",
                config.llm.api_key_env
            ))
            .yellow()
        );
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("Configuration saved.").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("Current configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Database:").bold().yellow());
    eprintln!("  Path: {}", style(config.database.path.display()).cyan());

    eprintln!();
    eprintln!("{}", style("LLM settings:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.llm.base_url).cyan());
    eprintln!("  Model: {}", style(&config.llm.model).cyan());
    eprintln!("  API key env: {}", style(&config.llm.api_key_env).cyan());
    eprintln!("  Top-k: {}", style(config.llm.top_k).cyan());

    eprintln!();
    eprintln!("{}", style("Import:").bold().yellow());
    eprintln!(
        "  GFF batch size: {}",
        style(config.import.gff_batch_size).cyan()
    );
    eprintln!(
        "  TSV batch size: {}",
        style(config.import.tsv_batch_size).cyan()
    );
    eprintln!(
        "  JSON concurrency: {}",
        style(config.import.json_concurrency).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: Config::config_dir()?,
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_llm(llm: &mut LlmConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("API base URL")
        .default(llm.base_url.clone())
        .validate_with(|input: &String| validate_base_url(input))
        .interact_text()?;
    llm.set_base_url(base_url)?;

    let model: String = Input::new()
        .with_prompt("Model")
        .default(llm.model.clone())
        .validate_with(|input: &String| {
            if input.trim().is_empty() {
                Err("model cannot be empty".to_string())
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    llm.set_model(model)?;

    let api_key_env: String = Input::new()
        .with_prompt("API key environment variable")
        .default(llm.api_key_env.clone())
        .interact_text()?;
    llm.set_api_key_env(api_key_env)?;

    Ok(())
}

fn validate_base_url(input: &str) -> Result<(), String> {
    url::Url::parse(input)
        .map(|_| ())
        .map_err(|e| format!("invalid URL: {e}"))
}
