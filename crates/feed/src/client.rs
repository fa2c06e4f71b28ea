// ABOUTME: Blocking HTTP client that fetches an OPDS feed and hands the body to the decoder.
// ABOUTME: Surfaces InvalidUrl, Transport, and Read errors; non-2xx statuses are decoded, not rejected.

use std::collections::HashMap;

use reqwest::blocking::Response;
use tracing::debug;
use url::Url;

use crate::error::FeedError;
use crate::models::Feed;
use crate::options::{ClientBuilder, DecodeMode, Options};
use crate::parser::parse_feed_bytes_with;

/// Fetches and decodes feeds. Cheap to clone; the HTTP connection pool is shared.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::blocking::Client,
    headers: HashMap<String, String>,
    decode_mode: DecodeMode,
}

impl Client {
    /// Client with default options (lenient decoding, 30s timeout).
    pub fn new() -> Result<Self, FeedError> {
        ClientBuilder::new().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn with_options(opts: Options) -> Result<Self, FeedError> {
        let http = match opts.http_client {
            Some(client) => client,
            None => reqwest::blocking::Client::builder()
                .timeout(opts.timeout)
                .user_agent(opts.user_agent)
                .build()
                .map_err(FeedError::Client)?,
        };
        Ok(Self {
            http,
            headers: opts.headers,
            decode_mode: opts.decode_mode,
        })
    }

    pub fn decode_mode(&self) -> DecodeMode {
        self.decode_mode
    }

    /// GETs `url` and decodes the body. No retries.
    pub fn fetch(&self, url: &str) -> Result<Feed, FeedError> {
        let parsed = validate_url(url)?;

        let mut request = self.http.get(parsed);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        debug!(url, "fetching OPDS feed");
        let response = request.send().map_err(|err| {
            if err.is_builder() {
                FeedError::Client(err)
            } else {
                FeedError::Transport(err)
            }
        })?;

        self.parse_response(response)
    }

    /// Reads the whole response body and decodes it with this client's mode.
    /// The status code is not checked: error pages are decoded like any other body.
    pub fn parse_response(&self, response: Response) -> Result<Feed, FeedError> {
        read_and_decode(response, self.decode_mode)
    }
}

/// Fetches `url` with a default client and decodes it leniently.
pub fn parse_url(url: &str) -> Result<Feed, FeedError> {
    Client::new()?.fetch(url)
}

/// Decodes an already-obtained response leniently, for callers that manage HTTP themselves.
pub fn parse_response(response: Response) -> Result<Feed, FeedError> {
    read_and_decode(response, DecodeMode::Lenient)
}

fn read_and_decode(response: Response, mode: DecodeMode) -> Result<Feed, FeedError> {
    let status = response.status();
    let final_url = response.url().to_string();
    if !status.is_success() {
        debug!(%status, url = %final_url, "decoding feed from non-success response");
    }

    let body = response.bytes().map_err(FeedError::read)?;
    debug!(bytes = body.len(), url = %final_url, "read feed body");
    parse_feed_bytes_with(&body, mode)
}

fn validate_url(url: &str) -> Result<Url, FeedError> {
    if url.is_empty() {
        return Err(FeedError::invalid_url("empty URL"));
    }
    let parsed =
        Url::parse(url).map_err(|e| FeedError::invalid_url(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FeedError::invalid_url(format!(
            "{url}: scheme must be http or https, got {other}"
        ))),
    }
}
