//! Error types for the zs-dl library.

use thiserror::Error;

/// Errors that can occur while expanding, resolving or downloading a link.
#[derive(Error, Debug)]
pub enum Error {
    /// The candidate string is not a share-page URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The decryption service failed or returned no links.
    #[error("Failed to decrypt DLC container {path}: {reason}")]
    ContainerExpansion {
        /// Path of the container file.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// The share page no longer carries the download challenge.
    #[error("Failed to get file URL from {url}: pattern not found or file unavailable")]
    PatternNotFound {
        /// Share page that was scanned.
        url: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status returned by the server.
        status: reqwest::StatusCode,
    },

    /// Streaming the response body to disk failed.
    #[error("Transfer of {url} failed: {source}")]
    Transfer {
        /// URL being streamed.
        url: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration file or command-line value.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A specialized `Result` type for zs-dl operations.
pub type Result<T> = std::result::Result<T, Error>;
