// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use storybook_config::ConfigManager;

mod commands;
mod reader;

fn build_cli() -> Command {
    Command::new("storybook")
        .version(env!("CARGO_PKG_VERSION"))
        .author("DrTomLLC")
        .about("Illustrated, narrated children's stories from a one-line idea")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the platform config dir)")
                .global(true),
        )
        .subcommand(
            Command::new("create")
                .about("Generate a story and read it interactively")
                .arg(
                    Arg::new("idea")
                        .value_name("IDEA")
                        .num_args(1..)
                        .help("What the story should be about; prompted for when omitted"),
                )
                .arg(
                    Arg::new("save-images")
                        .long("save-images")
                        .value_name("DIR")
                        .help("Write each page's illustration into DIR"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect or create the config file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config file if none exists"))
                .subcommand(
                    Command::new("show")
                        .about("Print the effective configuration")
                        .arg(
                            Arg::new("reveal")
                                .long("reveal")
                                .help("Print the API key instead of masking it")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(Command::new("path").about("Print the config file location")),
        )
        .subcommand(Command::new("devices").about("List audio output devices"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let manager = match matches.get_one::<String>("config") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new().context("Failed to locate config directory")?,
    };
    let config = manager.load_with_env_overrides().with_context(|| {
        format!(
            "Failed to load config from {}",
            manager.config_path().display()
        )
    })?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.as_str()),
    )
    .init();

    match matches.subcommand() {
        Some(("create", sub_matches)) => {
            let idea = sub_matches
                .get_many::<String>("idea")
                .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "));
            let image_dir = sub_matches.get_one::<String>("save-images").map(PathBuf::from);
            commands::create_story(&config, idea, image_dir).await
        }
        Some(("config", sub_matches)) => match sub_matches.subcommand() {
            Some(("init", _)) => commands::config_init(&manager),
            Some(("show", show_matches)) => {
                commands::config_show(&config, show_matches.get_flag("reveal"))
            }
            Some(("path", _)) => {
                commands::config_path(&manager);
                Ok(())
            }
            _ => anyhow::bail!("Missing config subcommand"),
        },
        Some(("devices", _)) => commands::list_devices(&config),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_create_collects_idea_words() {
        let matches = build_cli()
            .try_get_matches_from(["storybook", "create", "a", "sleepy", "dragon"])
            .expect("valid arguments");
        let (_, create) = matches.subcommand().expect("subcommand");
        let words: Vec<_> = create
            .get_many::<String>("idea")
            .expect("idea given")
            .map(String::as_str)
            .collect();
        assert_eq!(words, vec!["a", "sleepy", "dragon"]);
    }

    #[test]
    fn test_config_flag_is_global() {
        let matches = build_cli()
            .try_get_matches_from(["storybook", "config", "path", "--config", "/tmp/sb"])
            .expect("valid arguments");
        assert_eq!(
            matches.get_one::<String>("config").map(String::as_str),
            Some("/tmp/sb")
        );
    }

    #[test]
    fn test_config_requires_subcommand() {
        assert!(build_cli()
            .try_get_matches_from(["storybook", "config"])
            .is_err());
    }
}
