use crate::config::CrawlConfig;
use crate::filter::{UrlFilter, normalize_url};
use reqwest::{Client, ClientBuilder, header, redirect};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// A response that came back with status below 400
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after following redirects
    pub final_url: Url,
    pub status_code: u16,
    /// Time from sending the request until the response headers arrived
    pub elapsed_ms: u64,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Why a fetch produced no page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The server answered with status >= 400
    Status(u16),
    Timeout,
    TooManyRedirects,
    /// A redirect pointed outside the crawl scope and was not followed
    RedirectOutOfScope(Url),
    /// DNS, connection, or body read failure
    Network(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(code) => write!(f, "HTTP status {code}"),
            FetchFailure::Timeout => write!(f, "request timed out"),
            FetchFailure::TooManyRedirects => write!(f, "too many redirects"),
            FetchFailure::RedirectOutOfScope(target) => {
                write!(f, "redirect to {target} is outside the crawl scope")
            }
            FetchFailure::Network(message) => write!(f, "{message}"),
        }
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchFailure::Timeout
        } else if error.is_redirect() {
            FetchFailure::TooManyRedirects
        } else {
            FetchFailure::Network(error.to_string())
        }
    }
}

fn client_builder(config: &CrawlConfig) -> ClientBuilder {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout())
}

/// Client for site-level requests such as robots.txt
pub fn build_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    client_builder(config)
        .redirect(redirect::Policy::limited(config.max_redirects))
        .build()
}

/// Builds the single page client shared by every worker of a crawl.
///
/// Each redirect hop must pass the scope filter; an out-of-scope hop stops
/// and the 3xx response is returned as is.
pub fn build_page_client(
    config: &CrawlConfig,
    filter: Arc<UrlFilter>,
) -> Result<Client, reqwest::Error> {
    let max_redirects = config.max_redirects;
    let policy = redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            attempt.error("too many redirects")
        } else if filter.should_crawl(attempt.url()) {
            attempt.follow()
        } else {
            ::log::debug!("Not following redirect to {}", attempt.url());
            attempt.stop()
        }
    });
    client_builder(config).redirect(policy).build()
}

/// Fetches a URL, following in-scope redirects. Status >= 400 is a failure.
pub async fn fetch_page(client: &Client, url: &Url) -> Result<FetchedPage, FetchFailure> {
    let started = Instant::now();
    ::log::debug!("GET {}", url);

    let response = client.get(url.clone()).send().await?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(FetchFailure::Status(status.as_u16()));
    }

    if status.is_redirection() {
        let target = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|location| response.url().join(location).ok());
        if let Some(target) = target {
            return Err(FetchFailure::RedirectOutOfScope(normalize_url(&target)));
        }
    }

    let final_url = normalize_url(response.url());
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.bytes().await?.to_vec();

    if final_url != *url {
        ::log::debug!("{} redirected to {}", url, final_url);
    }

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        elapsed_ms,
        content_type,
        body,
    })
}
