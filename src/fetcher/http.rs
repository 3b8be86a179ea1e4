// src/fetcher/http.rs
// =============================================================================
// This module downloads a page and hands its body to the title extractor.
//
// Key functionality:
// - One shared reqwest Client (connection pooling, async DNS)
// - A per-request timeout; expiry is a failure like any other
// - The status code is NOT judged: a 404 page with a <title> is still a title
// - Failures come back as a typed FetchError instead of an empty string
//
// Rust concepts:
// - Traits: TitleFetcher lets the worker pool run against a fake in tests
// - async-trait: async fns inside a trait object
// - thiserror: deriving std::error::Error for our enum
// =============================================================================

use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::html::extract_title;

// Why a fetch-and-extract failed
//
// Transport failures and "no title" are kept apart so callers (and tests)
// can tell them apart; the worker treats them all the same way.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The string could not be parsed as an absolute URL
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Only http and https can be fetched
    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),

    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout(#[source] reqwest::Error),

    /// DNS lookup or TCP/TLS connect failed
    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    /// Anything else on the wire (reset, bad body encoding, too many redirects)
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The page arrived but has no non-empty <title>
    #[error("no title element found")]
    TitleNotFound,
}

impl FetchError {
    /// True when the page never arrived (as opposed to arriving without a title)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout(_) | FetchError::Connect(_) | FetchError::Transport(_)
        )
    }
}

// Anything that can turn a URL into a page title
//
// The worker pool only talks to this trait, never to reqwest directly.
#[async_trait]
pub trait TitleFetcher: Send + Sync {
    async fn fetch_title(&self, url: &str) -> Result<String, FetchError>;
}

// Settings for the HTTP client
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("title-harvester/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 10,
        }
    }
}

// The real fetcher: HTTP GET + title extraction
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Builds the shared client
    //
    // Client is cheap to clone (it's an Arc internally), so one instance is
    // shared by every worker.
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(FetchError::Transport)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl TitleFetcher for HttpFetcher {
    async fn fetch_title(&self, url: &str) -> Result<String, FetchError> {
        // Validate only; the submitted string is what gets stored
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        let response = self.client.get(parsed).send().await.map_err(categorize_error)?;
        debug!(url = %url, status = response.status().as_u16(), "fetched");

        // Decoded with the Content-Type charset (UTF-8 when none is given)
        let body = response.text().await.map_err(categorize_error)?;

        extract_title(&body).ok_or(FetchError::TitleNotFound)
    }
}

// Sorts reqwest errors into our buckets
fn categorize_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(error)
    } else if error.is_connect() {
        FetchError::Connect(error)
    } else {
        FetchError::Transport(error)
    }
}
