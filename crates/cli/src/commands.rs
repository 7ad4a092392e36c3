// FILE: crates/cli/src/commands.rs

use crate::reader::Reader;
use anyhow::{bail, Context, Result};
use console::style;
use media_engine::{AudioDeviceManager, AudioOutputConfig, CpalProvider, PlaybackEngine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use storybook_config::{Config, ConfigManager};
use storybook_network::{GeminiClient, GeminiConfig};
use storybook_session::StoryController;


const MASKED_KEY: &str = "********";

/// Generate a story and hand it to the interactive reader
pub async fn create_story(
    config: &Config,
    idea: Option<String>,
    image_dir: Option<PathBuf>,
) -> Result<()> {
    let client = Arc::new(
        GeminiClient::new(gemini_config(config)?).context("Failed to set up generation client")?,
    );

    let provider = CpalProvider::new(output_config(config));
    let engine = PlaybackEngine::with_format(
        Box::new(provider),
        config.audio.sample_rate,
        config.audio.channels,
    );

    let controller = StoryController::new(client.clone(), client.clone(), client, engine);

    if let Some(dir) = &image_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create image directory {}", dir.display()))?;
    }

    Reader::new(controller, image_dir).run(idea).await
}

/// Write a default config file
pub fn config_init(manager: &ConfigManager) -> Result<()> {
    let created = manager
        .initialize()
        .context("Failed to write default config")?;

    if created {
        println!(
            "{} Created {}",
            style("✓").green().bold(),
            manager.config_path().display()
        );
    } else {
        println!(
            "Config already exists at {}",
            manager.config_path().display()
        );
    }
    Ok(())
}

/// Print the effective configuration as TOML
pub fn config_show(config: &Config, reveal: bool) -> Result<()> {
    let shown = if reveal {
        config.clone()
    } else {
        masked(config)
    };
    print!("{}", shown.to_toml().context("Failed to render config")?);

    if let Err(errors) = config.validate() {
        eprintln!("\n{}", style("Problems found:").yellow().bold());
        for error in errors {
            eprintln!("  - {}", error);
        }
    }
    Ok(())
}

pub fn config_path(manager: &ConfigManager) {
    println!("{}", manager.config_path().display());
}

/// List audio output devices, marking the one narration will use
pub fn list_devices(config: &Config) -> Result<()> {
    let devices = AudioDeviceManager::new()
        .list_devices()
        .context("Failed to list audio devices")?;

    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    println!(
        "\n{} Audio Output Devices",
        style(devices.len()).bold().cyan()
    );
    println!("{}", "=".repeat(80));

    let selected = config.audio.output_device.as_deref();
    for device in devices {
        let in_use = match selected {
            Some(name) => device.name == name,
            None => device.is_default,
        };
        let marker = if in_use {
            style("▶").green().bold().to_string()
        } else {
            " ".to_string()
        };
        let default = if device.is_default { " [default]" } else { "" };

        println!("{} {}{}", marker, style(&device.name).bold(), default);
        println!(
            "    {} Hz, {} channel(s)",
            device.default_sample_rate, device.default_channels
        );
    }
    Ok(())
}

/// Builds the generation client settings from the loaded config
pub fn gemini_config(config: &Config) -> Result<GeminiConfig> {
    let generation = &config.generation;
    let Some(api_key) = generation.api_key() else {
        bail!(
            "No API key configured. Set GEMINI_API_KEY or add api_key under [generation] in the config file."
        );
    };

    Ok(GeminiConfig {
        api_base_url: generation.api_base_url.clone(),
        api_key: api_key.to_string(),
        story_model: generation.story_model.clone(),
        image_model: generation.image_model.clone(),
        speech_model: generation.speech_model.clone(),
        voice: generation.voice.clone(),
        page_count: generation.page_count,
        timeout: Duration::from_secs(generation.request_timeout_secs),
    })
}

/// Output device selection from the `[audio]` section
pub fn output_config(config: &Config) -> AudioOutputConfig {
    AudioOutputConfig {
        device_name: config.audio.output_device.clone(),
        buffer_size: config.audio.buffer_size,
    }
}

/// Copy of `config` with the API key masked
pub fn masked(config: &Config) -> Config {
    let mut shown = config.clone();
    if shown.generation.api_key.is_some() {
        shown.generation.api_key = Some(MASKED_KEY.to_string());
    }
    shown
}
