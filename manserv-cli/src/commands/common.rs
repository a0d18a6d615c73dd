//! Common helpers shared across CLI commands.

use std::path::Path;

use manserv::config::ConfigFile;

use crate::error::CliError;

/// Load the configuration: an explicit path must exist and parse, the
/// default path falls back to built-in defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    match path {
        Some(path) => ConfigFile::load(path).map_err(CliError::from),
        None => Ok(ConfigFile::load_default()),
    }
}
