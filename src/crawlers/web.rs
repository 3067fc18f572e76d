use crate::broken_links::BrokenLinkTracker;
use crate::config::CrawlConfig;
use crate::crawlers::fetch::{self, FetchFailure, FetchedPage};
use crate::error::CrawlError;
use crate::filter::{UrlFilter, normalize_url};
use crate::frontier::{Frontier, FrontierEntry};
use crate::parsers;
use crate::results::{CrawlOutput, CrawlStats, ResultSink};
use crate::robots::{self, RobotsPolicy};
use crate::utils::jittered_delay;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use url::Url;

/// Mutable traversal state. Only ever touched under the session mutex.
#[derive(Debug)]
struct CrawlState {
    frontier: Frontier,
    sink: ResultSink,
    broken_links: BrokenLinkTracker,
    pages_fetched: usize,
    /// Fetches admitted but not yet recorded; each holds one unit of page budget
    in_flight: usize,
    failed_fetches: usize,
    duplicates_skipped: usize,
    redirects_out_of_scope: usize,
    seed_failure: Option<String>,
}

impl CrawlState {
    fn new(max_depth: usize) -> Self {
        Self {
            frontier: Frontier::new(max_depth),
            sink: ResultSink::new(),
            broken_links: BrokenLinkTracker::new(),
            pages_fetched: 0,
            in_flight: 0,
            failed_fetches: 0,
            duplicates_skipped: 0,
            redirects_out_of_scope: 0,
            seed_failure: None,
        }
    }

    /// Budget check and dequeue happen under the same lock
    fn admit(&mut self, max_pages: usize) -> Admission {
        if self.pages_fetched >= max_pages {
            return Admission::Done;
        }
        // In-flight fetches may still fail and give their budget back
        if self.pages_fetched + self.in_flight >= max_pages {
            return Admission::Wait;
        }
        match self.frontier.dequeue_next() {
            Some(entry) => {
                self.in_flight += 1;
                Admission::Fetch(entry)
            }
            None if self.in_flight == 0 => Admission::Done,
            None => Admission::Wait,
        }
    }
}

enum Admission {
    Fetch(FrontierEntry),
    Wait,
    Done,
}

/// Read-only collaborators plus the shared state of one crawl
struct Session {
    state: Mutex<CrawlState>,
    /// Signalled whenever a fetch is recorded or a worker exits
    progress: Notify,
    client: Client,
    filter: Arc<UrlFilter>,
    max_pages: usize,
    delay: Duration,
    delay_jitter: f64,
}

/// Runs a complete crawl and returns the finalized datasets.
///
/// Fails only when the seed cannot be crawled at all.
pub async fn run(config: &CrawlConfig) -> Result<CrawlOutput, CrawlError> {
    config.validate()?;
    let seed = parse_seed(&config.start_url)?;
    let started = Instant::now();

    ::log::info!("Starting crawl of {}", seed);
    ::log::info!(
        "Max pages: {}, max depth: {}, concurrency: {}",
        config.max_pages,
        config.max_depth,
        config.max_concurrency
    );

    let robots = if config.respect_robots {
        let client = fetch::build_client(config)?;
        robots::fetch(&client, &seed, &config.user_agent).await
    } else {
        RobotsPolicy::allow_all()
    };
    if !robots.is_allowed(&seed) {
        return Err(CrawlError::SeedDisallowed(seed.to_string()));
    }

    let filter = UrlFilter::new(
        &seed,
        robots,
        &config.include_patterns,
        &config.exclude_patterns,
    )
    .map_err(|e| CrawlError::InvalidConfig(e.to_string()))?;
    let filter = Arc::new(filter);
    let client = fetch::build_page_client(config, Arc::clone(&filter))?;

    let mut state = CrawlState::new(config.max_depth);
    state.frontier.enqueue(seed.clone(), None, 0);

    let session = Arc::new(Session {
        state: Mutex::new(state),
        progress: Notify::new(),
        client,
        filter,
        max_pages: config.max_pages,
        delay: config.base_delay(),
        delay_jitter: config.delay_jitter,
    });

    let handles = spawn_workers(config.max_concurrency, &session);
    for (worker_id, handle) in handles.into_iter().enumerate() {
        if let Err(e) = handle.await {
            ::log::error!("Worker {} panicked: {}", worker_id, e);
        }
    }

    let state = std::mem::replace(&mut *session.state.lock().await, CrawlState::new(0));

    if state.sink.page_count() == 0 {
        return Err(CrawlError::SeedUnreachable {
            url: seed.to_string(),
            reason: state
                .seed_failure
                .unwrap_or_else(|| "no page was recorded".to_string()),
        });
    }

    let stats = CrawlStats {
        pages_fetched: state.pages_fetched,
        failed_fetches: state.failed_fetches,
        duplicates_skipped: state.duplicates_skipped,
        redirects_out_of_scope: state.redirects_out_of_scope,
        elapsed: started.elapsed(),
    };
    ::log::info!(
        "Crawl complete - {} pages, {} failed fetches, {} broken links in {:.2} seconds",
        stats.pages_fetched,
        stats.failed_fetches,
        state.broken_links.link_count(),
        stats.elapsed.as_secs_f64()
    );

    Ok(state.sink.finalize(state.broken_links, stats))
}

/// Validates the seed and strips its fragment
fn parse_seed(start_url: &str) -> Result<Url, CrawlError> {
    let url = Url::parse(start_url)
        .map_err(|e| CrawlError::InvalidSeed(format!("{start_url}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CrawlError::InvalidSeed(format!(
            "{start_url}: only http and https are supported"
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(CrawlError::InvalidSeed(format!("{start_url}: URL has no host")));
    }
    Ok(normalize_url(&url))
}

/// Spawns the worker pool
fn spawn_workers(num_workers: usize, session: &Arc<Session>) -> Vec<JoinHandle<()>> {
    (0..num_workers)
        .map(|worker_id| {
            let session = Arc::clone(session);
            ::log::trace!("Spawning worker {}", worker_id);
            tokio::spawn(async move {
                worker_processing_loop(worker_id, &session).await;
                // Waiting workers re-check for termination
                session.progress.notify_waiters();
                ::log::debug!("Worker {} completed processing loop", worker_id);
            })
        })
        .collect()
}

/// Pulls entries until the budget is spent or the frontier is drained
async fn worker_processing_loop(worker_id: usize, session: &Session) {
    let mut fetched_before = false;

    while let Some(entry) = get_next_entry(worker_id, session).await {
        if fetched_before {
            let delay = jittered_delay(session.delay, session.delay_jitter);
            ::log::trace!("Worker {} waiting {:?}", worker_id, delay);
            tokio::time::sleep(delay).await;
        }
        fetched_before = true;

        let outcome = fetch::fetch_page(&session.client, &entry.url).await;
        match outcome {
            Ok(page) => process_fetched_page(worker_id, session, entry, page).await,
            Err(FetchFailure::RedirectOutOfScope(target)) => {
                reject_redirect(session, &entry, &target).await
            }
            Err(failure) => record_failure(session, entry, failure).await,
        }
        session.progress.notify_waiters();
    }
}

/// Gets the next entry to fetch, waiting while other workers' fetches decide the outcome
async fn get_next_entry(worker_id: usize, session: &Session) -> Option<FrontierEntry> {
    loop {
        // Registered before the state check so no notification is missed
        let progress = session.progress.notified();
        {
            let mut state = session.state.lock().await;
            match state.admit(session.max_pages) {
                Admission::Fetch(entry) => {
                    ::log::trace!("Worker {} processing: {}", worker_id, entry.url);
                    return Some(entry);
                }
                Admission::Done => return None,
                Admission::Wait => {}
            }
        }
        ::log::trace!("Worker {} waiting for in-flight fetches", worker_id);
        progress.await;
    }
}

/// Records a successful page and queues its links
async fn process_fetched_page(
    worker_id: usize,
    session: &Session,
    entry: FrontierEntry,
    page: FetchedPage,
) {
    if page.final_url != entry.url && !session.filter.should_crawl(&page.final_url) {
        reject_redirect(session, &entry, &page.final_url).await;
        return;
    }

    let extraction = parsers::extract(&page, &session.filter);

    let mut state = session.state.lock().await;
    state.in_flight -= 1;

    if page.final_url != entry.url && !state.frontier.mark_visited(&page.final_url) {
        ::log::debug!(
            "Skipping {}: redirect target {} already visited",
            entry.url,
            page.final_url
        );
        state.duplicates_skipped += 1;
        return;
    }

    state.pages_fetched += 1;
    let depth = entry.depth + 1;
    let mut queued = 0;
    for link in extraction.links {
        if state
            .frontier
            .enqueue(link, Some(page.final_url.clone()), depth)
        {
            queued += 1;
        }
    }
    state.sink.push_page(extraction.record, extraction.images);

    ::log::info!(
        "Worker {} [{}/{}] {} ({} new links)",
        worker_id,
        state.pages_fetched,
        session.max_pages,
        page.final_url,
        queued
    );
}

/// Drops a fetch that ended outside the crawl scope. Neither a page nor a broken link.
async fn reject_redirect(session: &Session, entry: &FrontierEntry, target: &Url) {
    let mut state = session.state.lock().await;
    state.in_flight -= 1;
    state.redirects_out_of_scope += 1;
    ::log::debug!("Skipping {}: redirects out of scope to {}", entry.url, target);

    if entry.source.is_none() {
        state.seed_failure = Some(format!("redirected out of scope to {target}"));
    }
}

/// Attributes a failed fetch to the page that linked to it
async fn record_failure(session: &Session, entry: FrontierEntry, failure: FetchFailure) {
    let mut state = session.state.lock().await;
    state.in_flight -= 1;
    state.failed_fetches += 1;

    match &entry.source {
        Some(source) => {
            ::log::warn!("Broken link on {}: {} ({})", source, entry.url, failure);
            state
                .broken_links
                .record_failure(source.as_str(), entry.url.as_str());
        }
        None => {
            ::log::error!("Failed to fetch seed {}: {}", entry.url, failure);
            state.seed_failure = Some(failure.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://example.test/").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(
            parse_seed("https://example.test/#intro").unwrap().as_str(),
            "https://example.test/"
        );
        assert!(matches!(
            parse_seed("ftp://example.test/"),
            Err(CrawlError::InvalidSeed(_))
        ));
        assert!(matches!(
            parse_seed("not a url"),
            Err(CrawlError::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_admission_reserves_budget_for_in_flight_fetches() {
        let mut state = CrawlState::new(10);
        for path in ["/", "/a", "/b"] {
            state.frontier.enqueue(url(path), None, 0);
        }

        assert!(matches!(state.admit(2), Admission::Fetch(_)));
        assert!(matches!(state.admit(2), Admission::Fetch(_)));
        // both budget units are reserved
        assert!(matches!(state.admit(2), Admission::Wait));

        // one fetch failed and released its unit
        state.in_flight -= 1;
        assert!(matches!(state.admit(2), Admission::Fetch(_)));

        state.in_flight -= 2;
        state.pages_fetched = 2;
        assert!(matches!(state.admit(2), Admission::Done));
    }

    #[test]
    fn test_admission_waits_for_in_flight_before_finishing() {
        let mut state = CrawlState::new(10);
        state.frontier.enqueue(url("/"), None, 0);

        assert!(matches!(state.admit(5), Admission::Fetch(_)));
        // empty frontier but a fetch may still discover links
        assert!(matches!(state.admit(5), Admission::Wait));

        state.in_flight = 0;
        state.pages_fetched = 1;
        assert!(matches!(state.admit(5), Admission::Done));
    }
}
