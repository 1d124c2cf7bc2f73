//! Error types for the JACK capture source

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio server (JACK) errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to open client {client}: {reason}")]
    ClientOpen { client: String, reason: String },

    #[error("Failed to register port {port}: {reason}")]
    PortRegister { port: String, reason: String },

    #[error("Failed to activate client: {0}")]
    Activate(String),

    #[error("Failed to connect {from} -> {to}: {reason}")]
    PortConnect {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Channel {0} does not exist")]
    InvalidChannel(usize),

    #[error("Client is not active")]
    NotActive,
}

/// Source settings errors
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Invalid settings document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Settings document must be a JSON object")]
    NotAnObject,
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
