pub mod broken_links;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod frontier;
pub mod parsers;
pub mod results;
pub mod robots;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::CrawlConfig;
pub use error::CrawlError;
pub use results::{CrawlOutput, CrawlStats, ImageRecord, PageRecord};

/// Main builder for a single crawl session
pub struct Crawl {
    config: CrawlConfig,
}

impl Crawl {
    /// Create a new builder for the given seed URL with default settings
    pub fn new(start_url: &str) -> Self {
        Self {
            config: CrawlConfig::new(start_url),
        }
    }

    /// Use a complete configuration
    pub fn with_config(config: CrawlConfig) -> Self {
        Self { config }
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(path: impl AsRef<std::path::Path>) -> Result<Self, CrawlError> {
        Ok(Self::with_config(CrawlConfig::from_file(path)?))
    }

    /// Replace the seed URL, keeping the rest of the configuration
    pub fn with_start_url(mut self, start_url: &str) -> Self {
        self.config.start_url = start_url.to_string();
        self
    }

    /// Set the page budget
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the number of concurrent workers
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Set the maximum link depth from the seed
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Set the base politeness delay in milliseconds
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.delay_ms = delay_ms;
        self
    }

    /// Set the random spread of the delay, as a fraction of the base delay
    pub fn with_delay_jitter(mut self, jitter: f64) -> Self {
        self.config.delay_jitter = jitter;
        self
    }

    /// Set the per-request timeout in seconds
    pub fn with_request_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.request_timeout_secs = timeout_seconds;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.config.user_agent = user_agent.to_string();
        self
    }

    /// Enable or disable robots.txt handling
    pub fn respect_robots(mut self, respect: bool) -> Self {
        self.config.respect_robots = respect;
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Run the crawl to completion
    pub async fn run(self) -> Result<CrawlOutput, CrawlError> {
        crawlers::web::run(&self.config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let crawl = Crawl::new("https://example.test/")
            .with_start_url("https://example.test/start")
            .with_max_pages(2)
            .with_max_concurrency(3)
            .with_max_depth(4)
            .with_delay_ms(0)
            .with_delay_jitter(0.25)
            .respect_robots(false);

        let config = crawl.config();
        assert_eq!(config.start_url, "https://example.test/start");
        assert_eq!(config.max_pages, 2);
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.delay_jitter, 0.25);
        assert!(!config.respect_robots);
    }
}
