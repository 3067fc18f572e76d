use crate::error::CrawlError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Configuration for a single crawl session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// URL to start crawling from
    pub start_url: String,

    /// Maximum number of successfully fetched pages
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Number of workers fetching in parallel
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Maximum number of hops from the seed page
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Base politeness delay between two fetches of the same worker
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Fraction of `delay_ms` applied as random jitter in both directions
    #[serde(default = "default_delay_jitter")]
    pub delay_jitter: f64,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Redirect hops followed before a fetch counts as failed
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// User agent sent with every request and used to pick the robots.txt group
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether to fetch and honor the site's robots.txt
    #[serde(default = "default_respect_robots")]
    pub respect_robots: bool,

    /// Regex patterns for URLs to include
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_max_pages() -> usize {
    500
}

fn default_max_concurrency() -> usize {
    1
}

fn default_max_depth() -> usize {
    10
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_delay_jitter() -> f64 {
    0.5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; seo-crawl/0.1)".to_string()
}

fn default_respect_robots() -> bool {
    true
}

impl CrawlConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            max_pages: default_max_pages(),
            max_concurrency: default_max_concurrency(),
            max_depth: default_max_depth(),
            delay_ms: default_delay_ms(),
            delay_jitter: default_delay_jitter(),
            request_timeout_secs: default_request_timeout_secs(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            respect_robots: default_respect_robots(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CrawlError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, CrawlError> {
        serde_json::from_str(json).map_err(|e| CrawlError::InvalidConfig(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.max_pages == 0 {
            return Err(CrawlError::InvalidConfig(
                "max_pages must be at least 1".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(CrawlError::InvalidConfig(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.delay_jitter) {
            return Err(CrawlError::InvalidConfig(format!(
                "delay_jitter must be within 0.0..=1.0, got {}",
                self.delay_jitter
            )));
        }
        for pattern in self.include_patterns.iter().chain(&self.exclude_patterns) {
            Regex::new(pattern)
                .map_err(|e| CrawlError::InvalidConfig(format!("{pattern}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config = CrawlConfig::from_json(r#"{"start_url": "https://example.test/"}"#).unwrap();
        assert_eq!(config.max_pages, 500);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.delay_ms, 1000);
        assert!(config.respect_robots);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_from_json() {
        let json = r#"{
            "start_url": "https://example.test/",
            "max_pages": 25,
            "max_concurrency": 4,
            "exclude_patterns": ["/private/"]
        }"#;
        let config = CrawlConfig::from_json(json).unwrap();
        assert_eq!(config.max_pages, 25);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.exclude_patterns, vec!["/private/".to_string()]);
    }

    #[test]
    fn test_validate_rejects_zero_budget_and_bad_regex() {
        let mut config = CrawlConfig::new("https://example.test/");
        config.max_pages = 0;
        assert!(matches!(
            config.validate(),
            Err(CrawlError::InvalidConfig(_))
        ));

        let mut config = CrawlConfig::new("https://example.test/");
        config.include_patterns = vec!["(".to_string()];
        assert!(config.validate().is_err());

        let mut config = CrawlConfig::new("https://example.test/");
        config.delay_jitter = 1.5;
        assert!(config.validate().is_err());
    }
}
