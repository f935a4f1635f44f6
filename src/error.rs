//! Error types
//!
//! Startup errors (`ConfigError`, `WatchError::Setup`) abort the process.
//! Everything an upload can run into is an `UploadError` and stays inside
//! the task that hit it.

use std::path::PathBuf;
use thiserror::Error;

/// Missing or invalid settings. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON or has wrongly typed fields
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required key is absent from both the file and the environment
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// A key is present but its value is unusable
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Errors from the filesystem watch primitive
#[derive(Error, Debug)]
pub enum WatchError {
    /// Cannot attach to the source directory. Fatal at startup.
    #[error("cannot watch {path}: {reason}")]
    Setup { path: PathBuf, reason: String },

    /// Transient error reported while watching. Logged and ignored.
    #[error("watch error: {0}")]
    Runtime(String),
}

/// Per-upload failures. Logged, never propagated past the upload task.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("cannot connect to FTP server {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: suppaftp::FtpError,
    },

    #[error("login rejected for user {user}: {source}")]
    Authentication {
        user: String,
        #[source]
        source: suppaftp::FtpError,
    },

    #[error("cannot open file {path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transfer of {remote_name} failed: {source}")]
    Transfer {
        remote_name: String,
        #[source]
        source: suppaftp::FtpError,
    },
}
