use thiserror::Error;

/// Conditions that abort a crawl. Everything else is logged and skipped.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid seed URL: {0}")]
    InvalidSeed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Seed page {url} could not be fetched: {reason}")]
    SeedUnreachable { url: String, reason: String },

    #[error("Seed page {0} is disallowed by robots.txt")]
    SeedDisallowed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
