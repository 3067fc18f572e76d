use crate::robots::RobotsPolicy;
use regex::Regex;
use url::Url;

/// Link prefixes that never point at a fetchable page
const SKIPPED_PREFIXES: [&str; 4] = ["#", "mailto:", "tel:", "javascript:"];

/// Decides which discovered links belong to the crawl
#[derive(Debug)]
pub struct UrlFilter {
    /// Seed host with any leading `www.` removed
    site_host: String,
    robots: RobotsPolicy,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Create a filter scoped to the seed URL's host
    pub fn new(
        seed: &Url,
        robots: RobotsPolicy,
        include_patterns: &[String],
        exclude_patterns: &[String],
    ) -> Result<Self, regex::Error> {
        let mut include_regexes = Vec::with_capacity(include_patterns.len());
        for pattern in include_patterns {
            include_regexes.push(Regex::new(pattern)?);
        }

        let mut exclude_regexes = Vec::with_capacity(exclude_patterns.len());
        for pattern in exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            site_host: comparable_host(seed).unwrap_or_default(),
            robots,
            include_regexes,
            exclude_regexes,
        })
    }

    /// Resolve `candidate` against `base` and return its canonical form if in scope.
    ///
    /// `None` means rejected: unsupported scheme, pseudo-link, other domain,
    /// robots-disallowed, or filtered out by a pattern.
    pub fn accept(&self, candidate: &str, base: &Url) -> Option<Url> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }
        let lowered = candidate.to_ascii_lowercase();
        if SKIPPED_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
            return None;
        }

        let resolved = base.join(candidate).ok()?;
        let normalized = normalize_url(&resolved);
        if self.should_crawl(&normalized) {
            Some(normalized)
        } else {
            None
        }
    }

    /// Determine if an absolute URL passes every scope rule
    pub fn should_crawl(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        if !self.is_in_domain_scope(url) {
            return false;
        }

        if !self.robots.is_allowed(url) {
            ::log::trace!("robots.txt disallows {}", url);
            return false;
        }

        let url_str = url.as_str();
        if self.exclude_regexes.iter().any(|r| r.is_match(url_str)) {
            return false;
        }

        self.include_regexes.is_empty() || self.include_regexes.iter().any(|r| r.is_match(url_str))
    }

    fn is_in_domain_scope(&self, url: &Url) -> bool {
        match comparable_host(url) {
            Some(host) => host == self.site_host,
            None => false,
        }
    }
}

/// Host used for domain comparison only; the stored URL keeps its `www.`
fn comparable_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    })
}

/// Create a normalized version of the URL (fragments removed)
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized
}
