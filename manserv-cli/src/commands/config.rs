//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path`
//! commands for viewing and modifying server settings from the command
//! line. Product sections are edited in the file directly; only scalar
//! server settings are exposed as keys.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Subcommand;
use manserv::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., server.listen)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., server.listen)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// A settable configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServingDir,
    Listen,
    Index,
}

impl ConfigKey {
    /// All known keys, in listing order.
    pub fn all() -> &'static [ConfigKey] {
        &[ConfigKey::ServingDir, ConfigKey::Listen, ConfigKey::Index]
    }

    /// Full key name (`section.key`).
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::ServingDir => "server.serving_dir",
            ConfigKey::Listen => "server.listen",
            ConfigKey::Index => "server.index",
        }
    }

    /// Current value in `config`.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ServingDir => config.server.serving_dir.display().to_string(),
            ConfigKey::Listen => config.server.listen.clone(),
            ConfigKey::Index => config.server.index.clone(),
        }
    }

    /// Replace the value in `config`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) {
        match self {
            ConfigKey::ServingDir => config.server.serving_dir = PathBuf::from(value),
            ConfigKey::Listen => config.server.listen = value.to_string(),
            ConfigKey::Index => config.server.index = value.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or(())
    }
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'manserv config list' to see available keys.",
            key
        ))
    })
}

fn default_path() -> Result<PathBuf, CliError> {
    config_file_path()
        .ok_or_else(|| CliError::Config("no user configuration directory".to_string()))
}

fn run_get(key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = ConfigFile::load_default();
    println!("{}", config_key.get(&config));
    Ok(())
}

fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let mut config = ConfigFile::load_default();
    config_key.set(&mut config, value);
    config.save(&default_path()?)?;

    println!("Set {} = {}", config_key.name(), value);
    Ok(())
}

fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load_default();

    for key in ConfigKey::all() {
        println!("{} = {}", key.name(), key.get(&config));
    }
    if !config.products.is_empty() {
        println!();
        for product in &config.products {
            println!(
                "product.{}: aliases = [{}], cache = [{}]",
                product.name,
                product.aliases.join(", "),
                product
                    .cache_dirs
                    .iter()
                    .map(|dir| dir.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", default_path()?.display());
    Ok(())
}
