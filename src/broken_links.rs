use crate::results::PageRecord;
use std::collections::HashMap;

/// Failed outbound links, keyed by the page that linked to them
#[derive(Debug, Default)]
pub struct BrokenLinkTracker {
    failures: HashMap<String, Vec<String>>,
}

impl BrokenLinkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duplicates are kept, in discovery order
    pub fn record_failure(&mut self, source_url: &str, target_url: &str) {
        self.failures
            .entry(source_url.to_string())
            .or_default()
            .push(target_url.to_string());
    }

    #[cfg(test)]
    fn failures_for(&self, source_url: &str) -> &[String] {
        self.failures
            .get(source_url)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total failed links across all sources
    pub fn link_count(&self) -> usize {
        self.failures.values().map(Vec::len).sum()
    }

    /// Copy each source's failures onto its record.
    ///
    /// Sources without a record are dropped.
    pub fn attach_to(mut self, pages: &mut [PageRecord]) {
        for page in pages.iter_mut() {
            if let Some(links) = self.failures.remove(&page.url) {
                page.broken_links = links;
            }
        }
        if !self.failures.is_empty() {
            ::log::debug!(
                "Dropping broken links from {} pages without a record",
                self.failures.len()
            );
        }
    }
}
