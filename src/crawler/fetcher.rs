//! Page fetching
//!
//! This module defines the `PageFetcher` seam the crawl runs against and its
//! HTTP implementation:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with redirects followed by reqwest
//! - Rejecting non-success statuses and non-HTML content
//! - Extracting metadata and outbound links from the body

use crate::config::{Config, UserAgentConfig};
use crate::crawler::parser::parse_html;
use crate::FetchError;
use reqwest::{redirect::Policy, Client};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed for one fetch
const MAX_REDIRECTS: usize = 10;

/// What a successful fetch yields for one address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub title: String,
    pub description: String,
    pub headers: Vec<String>,
    /// Absolute http/https addresses linked from the page
    pub links: Vec<String>,
}

/// Fetches one address and extracts its metadata and outbound links
///
/// Implementations must only return absolute http/https links.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use ripple_bfs::config::UserAgentConfig;
/// use ripple_bfs::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `PageFetcher` backed by reqwest and scraper
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from the user agent and timeout settings
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        Ok(Self::new(client))
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        fetch_page(&self.client, url).await
    }
}

/// Fetches a URL and extracts its page metadata
///
/// # Failure Handling
///
/// | Condition | Result |
/// |-----------|--------|
/// | Transport error (DNS, TLS, timeout, redirect limit) | `FetchError::Http` |
/// | Non-2xx status | `FetchError::Status` |
/// | Content-Type present and not HTML | `FetchError::NotHtml` |
/// | Body cannot be decoded | `FetchError::Body` |
///
/// Relative links are resolved against the final URL after redirects.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html(&content_type) {
        return Err(FetchError::NotHtml {
            url: url.to_string(),
            content_type,
        });
    }

    let final_url: Url = response.url().clone();
    let body = response.text().await.map_err(|e| FetchError::Body {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let parsed = parse_html(&body, &final_url);

    Ok(FetchedPage {
        title: parsed.title.unwrap_or_default(),
        description: parsed.description.unwrap_or_default(),
        headers: parsed.headers,
        links: parsed.links,
    })
}

/// A missing Content-Type is given the benefit of the doubt
fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.is_empty()
        || content_type.contains("text/html")
        || content_type.contains("application/xhtml+xml")
}
