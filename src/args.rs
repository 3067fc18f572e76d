use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seo-crawl")]
#[command(about = "Crawls a site and reports on-page SEO signals and broken links")]
#[command(version)]
pub struct Args {
    /// Starting URL for the crawl (https:// is assumed when no scheme is given)
    pub url: String,

    /// Maximum number of pages to crawl
    pub max_pages_positional: Option<usize>,

    /// Maximum number of pages to crawl (takes precedence over the positional form)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Number of concurrent fetches
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Maximum link depth from the starting URL
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Base delay between requests in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// User agent sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Do not fetch or honor robots.txt
    #[arg(long)]
    pub ignore_robots: bool,

    /// JSON configuration file; command-line flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the CSV reports are written to
    #[arg(short, long, default_value = "webcrawler_reports")]
    pub output_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// The seed URL with a scheme
    pub fn seed_url(&self) -> String {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            self.url.clone()
        } else {
            format!("https://{}", self.url)
        }
    }

    pub fn max_pages(&self) -> Option<usize> {
        self.max_pages.or(self.max_pages_positional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_defaults_to_https() {
        let args = Args::parse_from(["seo-crawl", "example.test"]);
        assert_eq!(args.seed_url(), "https://example.test");

        let args = Args::parse_from(["seo-crawl", "http://example.test/"]);
        assert_eq!(args.seed_url(), "http://example.test/");
    }

    #[test]
    fn test_max_pages_flag_wins() {
        let args = Args::parse_from(["seo-crawl", "example.test", "20"]);
        assert_eq!(args.max_pages(), Some(20));

        let args = Args::parse_from(["seo-crawl", "example.test", "20", "--max-pages", "5"]);
        assert_eq!(args.max_pages(), Some(5));

        let args = Args::parse_from(["seo-crawl", "example.test"]);
        assert_eq!(args.max_pages(), None);
    }
}
