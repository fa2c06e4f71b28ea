// ABOUTME: Configuration for fetching and decoding feeds: DecodeMode, Options, and ClientBuilder.
// ABOUTME: ClientBuilder provides a fluent API for constructing Client instances with custom settings.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::client::Client;
use crate::error::FeedError;

/// How the decoder reacts to malformed XML and unconvertible values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Log the problem and return whatever was decoded so far.
    #[default]
    Lenient,
    /// Fail with `FeedError::Decode`.
    Strict,
}

impl fmt::Display for DecodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecodeMode::Lenient => "lenient",
            DecodeMode::Strict => "strict",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for DecodeMode {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "strict" => DecodeMode::Strict,
            _ => DecodeMode::Lenient,
        }
    }
}

/// Configuration options for the feed client.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    pub decode_mode: DecodeMode,
    /// Used as-is when set; `timeout`, `user_agent` and `headers` are then ignored.
    pub http_client: Option<reqwest::blocking::Client>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("opds-feed/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: HashMap::new(),
            decode_mode: DecodeMode::Lenient,
            http_client: None,
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the request timeout (connect and read combined).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    pub fn decode_mode(mut self, mode: DecodeMode) -> Self {
        self.opts.decode_mode = mode;
        self
    }

    /// Shorthand for `decode_mode(DecodeMode::Strict)`.
    pub fn strict(self) -> Self {
        self.decode_mode(DecodeMode::Strict)
    }

    /// Use a preconfigured HTTP client.
    pub fn http_client(mut self, client: reqwest::blocking::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Result<Client, FeedError> {
        Client::with_options(self.opts)
    }

    /// Get the current options (for inspection/testing).
    pub fn options(&self) -> &Options {
        &self.opts
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
