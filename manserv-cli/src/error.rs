//! CLI error types.

use std::fmt;

use manserv::config::ConfigError;
use manserv::index::{BuildError, StorageError};
use manserv::server::ServerError;

/// Errors surfaced to the command line.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem.
    Config(String),

    /// Index build failed.
    Build(BuildError),

    /// Index file could not be read or written.
    Index(StorageError),

    /// Server failed to start or run.
    Server(ServerError),

    /// Filesystem problem outside the index itself.
    Io(std::io::Error),

    /// Failed to create the Tokio runtime.
    RuntimeCreation(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Build(e) => write!(f, "Failed to build index: {}", e),
            CliError::Index(e) => write!(f, "Index file error: {}", e),
            CliError::Server(e) => write!(f, "Server error: {}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::RuntimeCreation(e) => write!(f, "Failed to create Tokio runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Build(e) => Some(e),
            CliError::Index(e) => Some(e),
            CliError::Server(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::RuntimeCreation(e) => Some(e),
        }
    }
}

impl From<BuildError> for CliError {
    fn from(e: BuildError) -> Self {
        CliError::Build(e)
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        CliError::Index(e)
    }
}

impl From<ServerError> for CliError {
    fn from(e: ServerError) -> Self {
        CliError::Server(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}
