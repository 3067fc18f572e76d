use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    /// Page that linked here; `None` for the seed
    pub source: Option<Url>,
    /// Hops from the seed
    pub depth: usize,
}

/// FIFO queue of discovered URLs plus the set of URLs already scheduled.
///
/// A URL is known from the moment it is enqueued, and visited from the
/// moment it is dequeued, so it can never be fetched twice.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    /// Queued or visited
    known: HashSet<String>,
    visited: HashSet<String>,
    max_depth: usize,
}

impl Frontier {
    pub fn new(max_depth: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            known: HashSet::new(),
            visited: HashSet::new(),
            max_depth,
        }
    }

    /// Queue a URL unless it is too deep or already known. Returns whether it was queued.
    pub fn enqueue(&mut self, url: Url, source: Option<Url>, depth: usize) -> bool {
        if depth > self.max_depth {
            ::log::trace!("Dropping {} (depth {} > max {})", url, depth, self.max_depth);
            return false;
        }
        if !self.known.insert(url.as_str().to_string()) {
            return false;
        }
        self.queue.push_back(FrontierEntry { url, source, depth });
        true
    }

    /// Pop the oldest entry and mark it visited.
    ///
    /// Entries whose URL was visited in the meantime (as a redirect target)
    /// are skipped.
    pub fn dequeue_next(&mut self) -> Option<FrontierEntry> {
        while let Some(entry) = self.queue.pop_front() {
            if self.mark_visited(&entry.url) {
                return Some(entry);
            }
        }
        None
    }

    /// Returns `false` if the URL had already been visited
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        let key = url.as_str();
        self.known.insert(key.to_string());
        self.visited.insert(key.to_string())
    }

    #[cfg(test)]
    fn contains(&self, url: &str) -> bool {
        self.known.contains(url)
    }

    #[cfg(test)]
    fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://example.test/").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new(10);
        for path in ["/a", "/b", "/c"] {
            assert!(frontier.enqueue(url(path), Some(url("/")), 1));
        }

        let order: Vec<String> = std::iter::from_fn(|| frontier.dequeue_next())
            .map(|e| e.url.path().to_string())
            .collect();
        assert_eq!(order, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_enqueue_deduplicates_queued_and_visited() {
        let mut frontier = Frontier::new(10);
        assert!(frontier.enqueue(url("/a"), None, 0));
        assert!(!frontier.enqueue(url("/a"), None, 0));
        assert_eq!(frontier.len(), 1);

        let entry = frontier.dequeue_next().unwrap();
        assert!(frontier.is_visited(entry.url.as_str()));
        assert!(!frontier.enqueue(url("/a"), Some(url("/b")), 1));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_depth_limit() {
        let mut frontier = Frontier::new(2);
        assert!(frontier.enqueue(url("/two"), None, 2));
        assert!(!frontier.enqueue(url("/three"), None, 3));
        assert!(!frontier.contains(url("/three").as_str()));
    }

    #[test]
    fn test_redirect_target_visited_before_dequeue_is_skipped() {
        let mut frontier = Frontier::new(10);
        frontier.enqueue(url("/old"), None, 0);
        frontier.enqueue(url("/new"), None, 0);

        let first = frontier.dequeue_next().unwrap();
        assert_eq!(first.url.path(), "/old");
        // /old redirected to /new
        assert!(frontier.mark_visited(&url("/new")));

        assert!(frontier.dequeue_next().is_none());
        assert!(!frontier.mark_visited(&url("/new")));
    }

    #[test]
    fn test_visited_url_is_always_rejected() {
        let mut frontier = Frontier::new(10);
        frontier.enqueue(url("/"), None, 0);
        frontier.dequeue_next().unwrap();

        for depth in 0..3 {
            assert!(!frontier.enqueue(url("/"), Some(url("/a")), depth));
        }
        assert!(frontier.dequeue_next().is_none());
    }
}
