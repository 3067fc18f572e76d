use clap::Parser;
use seo_crawl::utils::report_stem;
use seo_crawl::{CrawlConfig, CrawlError, CrawlOutput};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use url::Url;

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("{}", e);
            std::process::exit(1);
        }
    };

    ::log::info!("Starting crawler for URL: {}", config.start_url);

    let output = match seo_crawl::Crawl::with_config(config.clone()).run().await {
        Ok(output) => output,
        Err(e) => {
            ::log::error!("Crawl failed: {}", e);
            std::process::exit(1);
        }
    };

    match write_reports(&output, &config.start_url, &args.output_dir) {
        Ok((pages_path, images_path)) => {
            ::log::info!("Pages report saved to: {}", pages_path.display());
            ::log::info!("Images report saved to: {}", images_path.display());
            ::log::info!("Total pages crawled: {}", output.pages.len());
        }
        Err(e) => {
            ::log::error!("Failed to write reports: {}", e);
            std::process::exit(1);
        }
    }
}

/// Layers command-line flags over the optional configuration file
fn build_config(args: &Args) -> Result<CrawlConfig, CrawlError> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = CrawlConfig::from_file(path)?;
            config.start_url = args.seed_url();
            config
        }
        None => CrawlConfig::new(&args.seed_url()),
    };

    if let Some(max_pages) = args.max_pages() {
        config.max_pages = max_pages;
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.delay_ms = delay_ms;
    }
    if let Some(user_agent) = &args.user_agent {
        config.user_agent = user_agent.clone();
    }
    if args.ignore_robots {
        config.respect_robots = false;
    }
    Ok(config)
}

/// Writes `{domain}_crawl_report.csv` and `{domain}_images.csv`
fn write_reports(
    output: &CrawlOutput,
    start_url: &str,
    output_dir: &Path,
) -> Result<(PathBuf, PathBuf), CrawlError> {
    let seed = Url::parse(start_url).map_err(|e| CrawlError::InvalidSeed(e.to_string()))?;
    let stem = report_stem(&seed);
    fs::create_dir_all(output_dir)?;

    let pages_path = output_dir.join(format!("{stem}_crawl_report.csv"));
    output.write_pages_csv(File::create(&pages_path)?)?;

    let images_path = output_dir.join(format!("{stem}_images.csv"));
    output.write_images_csv(File::create(&images_path)?)?;

    Ok((pages_path, images_path))
}
