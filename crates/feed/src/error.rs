// ABOUTME: Error types for fetching and decoding OPDS feeds.
// ABOUTME: Provides FeedError with InvalidUrl, Transport, Read, Decode, and Client variants.

use std::fmt;
use thiserror::Error;

/// Errors that can occur while fetching or decoding a feed.
///
/// Classification and metadata extraction never fail, so every variant here
/// belongs to the fetch-then-decode pipeline.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a response (connection refused, DNS, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body (or input stream) could not be read to the end.
    #[error("failed to read feed body: {0}")]
    Read(String),

    /// The document is not well-formed, or a value failed type conversion.
    /// Only returned when decoding in strict mode.
    #[error("failed to decode feed: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed from the configured options.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FeedError {
    /// Creates a Decode error from any displayable cause.
    pub fn decode(err: impl fmt::Display) -> Self {
        FeedError::Decode(err.to_string())
    }

    /// Creates a Read error from any displayable cause.
    pub fn read(err: impl fmt::Display) -> Self {
        FeedError::Read(err.to_string())
    }

    /// Creates an InvalidUrl error with a custom message.
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        FeedError::InvalidUrl(msg.into())
    }

    pub fn is_invalid_url(&self) -> bool {
        matches!(self, FeedError::InvalidUrl(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, FeedError::Transport(_))
    }

    /// Returns true if the underlying transport failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            FeedError::Transport(err) => err.is_timeout(),
            _ => false,
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, FeedError::Read(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, FeedError::Decode(_))
    }
}
