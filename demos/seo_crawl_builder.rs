use clap::Parser;
use seo_crawl::Crawl;
use std::error::Error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL to crawl
    #[arg(short, long)]
    url: String,

    /// Path to JSON configuration file
    #[arg(short, long)]
    config_file: Option<String>,

    /// Page budget
    #[arg(short, long)]
    max_pages: Option<usize>,

    /// Number of concurrent workers
    #[arg(long)]
    concurrency: Option<usize>,

    /// Base politeness delay in milliseconds
    #[arg(short, long)]
    delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Args::parse();

    println!("Starting crawl of {}", args.url);

    let mut crawl = match args.config_file {
        Some(config_file) => {
            println!("Loading configuration from file: {}", config_file);
            Crawl::with_config_file(config_file)?.with_start_url(&args.url)
        }
        None => Crawl::new(&args.url),
    };

    if let Some(max_pages) = args.max_pages {
        println!("Overriding page budget: {}", max_pages);
        crawl = crawl.with_max_pages(max_pages);
    }
    if let Some(concurrency) = args.concurrency {
        println!("Overriding max concurrency: {}", concurrency);
        crawl = crawl.with_max_concurrency(concurrency);
    }
    if let Some(delay_ms) = args.delay_ms {
        println!("Overriding delay: {}ms", delay_ms);
        crawl = crawl.with_delay_ms(delay_ms);
    }

    let output = crawl.run().await?;

    for page in &output.pages {
        println!(
            "{} [{}] title={:?} h1={} broken={}",
            page.url,
            page.status_code,
            page.title,
            page.h1_count,
            page.broken_links.len()
        );
    }
    let missing_alt = output.images.iter().filter(|i| i.alt_missing).count();
    println!(
        "Crawled {} pages ({} failed fetches, {} images missing alt) in {:.2} seconds.",
        output.stats.pages_fetched,
        output.stats.failed_fetches,
        missing_alt,
        output.stats.elapsed.as_secs_f64()
    );

    Ok(())
}
