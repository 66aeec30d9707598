/*!
 * Error types for the pairport application.
 *
 * This module contains custom error types for the different pipeline stages,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when talking to an engine provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The response stream broke off or carried an error event
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors raised while resolving the dependency closure of the focal file
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The focal file's extension belongs to neither language
    #[error("Unsupported file extension: {0:?}")]
    UnsupportedExtension(PathBuf),

    /// One or more dependencies lack a file on either side
    #[error("Missing dependencies:\n{}", format_paths(.missing))]
    MissingDependencies {
        /// Every absent path, source and target side alike
        missing: Vec<PathBuf>,
    },

    /// The focal file itself could not be read
    #[error("Cannot read focal file {path:?}: {message}")]
    FocalUnreadable { path: PathBuf, message: String },
}

/// Errors in configuration or model selection
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The model selector key is not in the configured model table
    #[error("Unknown model key: {0}")]
    UnknownModel(String),

    /// No credential file for the selected vendor
    #[error("Missing credential for {vendor}: expected a token in {path:?}")]
    MissingCredential { vendor: String, path: PathBuf },

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A single failed write; the rest of the batch still runs
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to write {path:?}: {message}")]
pub struct WriteError {
    pub path: PathBuf,
    pub message: String,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from the engine
    #[error("Engine error: {0}")]
    Engine(#[from] ProviderError),

    /// Error resolving dependencies
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// Error in configuration
    #[error("{0}")]
    Config(#[from] ConfigError),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}
