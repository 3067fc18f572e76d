use crate::broken_links::BrokenLinkTracker;
use crate::error::CrawlError;
use std::io::Write;
use std::time::Duration;

/// Column headers of the pages dataset, in output order
pub const PAGE_COLUMNS: [&str; 15] = [
    "URL",
    "Status Code",
    "Title",
    "Title Length",
    "Meta Description",
    "Meta Description Length",
    "Meta Keywords",
    "H1 Count",
    "H1 Text",
    "H2 Count",
    "Response Time (ms)",
    "Content Type",
    "Content Length",
    "Images Missing Alt",
    "Broken Links",
];

/// Column headers of the images dataset, in output order
pub const IMAGE_COLUMNS: [&str; 4] = ["Page URL", "Image URL", "Alt Text", "Alt Missing"];

/// Separator used when a list is flattened into one cell
pub const LIST_SEPARATOR: &str = "; ";

/// SEO signals of one successfully fetched page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRecord {
    /// Final URL after redirects
    pub url: String,
    pub status_code: u16,
    pub title: String,
    /// Length of the trimmed title in characters
    pub title_length: usize,
    pub meta_description: String,
    pub meta_description_length: usize,
    pub meta_keywords: String,
    pub h1_count: usize,
    /// Trimmed text of the first `<h1>`
    pub h1_text: String,
    pub h2_count: usize,
    pub response_time_ms: u64,
    pub content_type: String,
    /// Raw body size in bytes
    pub content_length: usize,
    pub images_missing_alt: Vec<String>,
    /// Outbound links that failed; filled in after the crawl
    pub broken_links: Vec<String>,
}

impl PageRecord {
    fn csv_row(&self) -> [String; 15] {
        [
            self.url.clone(),
            self.status_code.to_string(),
            self.title.clone(),
            self.title_length.to_string(),
            self.meta_description.clone(),
            self.meta_description_length.to_string(),
            self.meta_keywords.clone(),
            self.h1_count.to_string(),
            self.h1_text.clone(),
            self.h2_count.to_string(),
            self.response_time_ms.to_string(),
            self.content_type.clone(),
            self.content_length.to_string(),
            self.images_missing_alt.join(LIST_SEPARATOR),
            self.broken_links_field(),
        ]
    }

    /// Broken links flattened for the tabular output; empty when none failed
    pub fn broken_links_field(&self) -> String {
        self.broken_links.join(LIST_SEPARATOR)
    }
}

/// One `<img>` element found on a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub page_url: String,
    /// Absolute image URL; empty when the element had no `src`
    pub image_url: String,
    pub alt_text: String,
    pub alt_missing: bool,
}

impl ImageRecord {
    pub fn new(page_url: &str, image_url: String, alt_text: Option<&str>) -> Self {
        let alt_text = alt_text.unwrap_or_default().to_string();
        Self {
            page_url: page_url.to_string(),
            image_url,
            alt_missing: alt_text.trim().is_empty(),
            alt_text,
        }
    }

    fn csv_row(&self) -> [&str; 4] {
        [
            self.page_url.as_str(),
            self.image_url.as_str(),
            self.alt_text.as_str(),
            if self.alt_missing { "True" } else { "False" },
        ]
    }
}

/// Counters reported once the crawl ends
#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    pub pages_fetched: usize,
    pub failed_fetches: usize,
    pub duplicates_skipped: usize,
    /// Redirects into disallowed or off-site URLs
    pub redirects_out_of_scope: usize,
    pub elapsed: Duration,
}

/// Everything a finished crawl hands to the report writer
#[derive(Debug, Clone, Default)]
pub struct CrawlOutput {
    /// In fetch order
    pub pages: Vec<PageRecord>,
    /// In fetch order, then document order within a page
    pub images: Vec<ImageRecord>,
    pub stats: CrawlStats,
}

impl CrawlOutput {
    /// Write the pages dataset as CSV with a header row
    pub fn write_pages_csv<W: Write>(&self, writer: W) -> Result<(), CrawlError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(PAGE_COLUMNS)?;
        for page in &self.pages {
            csv_writer.write_record(page.csv_row())?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the images dataset as CSV with a header row
    pub fn write_images_csv<W: Write>(&self, writer: W) -> Result<(), CrawlError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(IMAGE_COLUMNS)?;
        for image in &self.images {
            csv_writer.write_record(image.csv_row())?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Append-only accumulator of page and image records
#[derive(Debug, Default)]
pub struct ResultSink {
    pages: Vec<PageRecord>,
    images: Vec<ImageRecord>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&mut self, page: PageRecord, images: Vec<ImageRecord>) {
        self.pages.push(page);
        self.images.extend(images);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Merge broken-link annotations and hand over both collections
    pub fn finalize(self, broken_links: BrokenLinkTracker, stats: CrawlStats) -> CrawlOutput {
        let mut pages = self.pages;
        broken_links.attach_to(&mut pages);
        CrawlOutput {
            pages,
            images: self.images,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            status_code: 200,
            content_type: "text/html".to_string(),
            ..PageRecord::default()
        }
    }

    #[test]
    fn test_alt_missing_follows_trimmed_alt() {
        let cases = [
            (None, true),
            (Some(""), true),
            (Some("   "), true),
            (Some(" logo "), false),
        ];
        for (alt, missing) in cases {
            let image = ImageRecord::new("https://example.test/", "x.png".to_string(), alt);
            assert_eq!(image.alt_missing, missing, "alt {alt:?}");
        }
    }

    #[test]
    fn test_finalize_keeps_order_and_attaches_broken_links() {
        let mut sink = ResultSink::new();
        sink.push_page(page("https://example.test/"), Vec::new());
        sink.push_page(page("https://example.test/b"), Vec::new());
        sink.push_page(page("https://example.test/a"), Vec::new());

        let mut tracker = BrokenLinkTracker::new();
        tracker.record_failure("https://example.test/b", "https://example.test/gone");

        let output = sink.finalize(tracker, CrawlStats::default());
        let urls: Vec<&str> = output.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.test/",
                "https://example.test/b",
                "https://example.test/a"
            ]
        );
        assert_eq!(output.pages[0].broken_links_field(), "");
        assert_eq!(output.pages[1].broken_links_field(), "https://example.test/gone");
    }

    #[test]
    fn test_pages_csv_header_and_row() {
        let mut record = page("https://example.test/");
        record.title = "Home, sweet home".to_string();
        record.title_length = 16;
        record.images_missing_alt = vec!["https://example.test/a.png".to_string()];
        let output = CrawlOutput {
            pages: vec![record],
            ..CrawlOutput::default()
        };

        let mut buffer = Vec::new();
        output.write_pages_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next().unwrap(), PAGE_COLUMNS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "https://example.test/,200,\"Home, sweet home\",16,,0,,0,,0,0,text/html,0,https://example.test/a.png,"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_images_csv() {
        let output = CrawlOutput {
            images: vec![
                ImageRecord::new("https://example.test/", "https://example.test/x.png".to_string(), None),
                ImageRecord::new("https://example.test/", "https://example.test/y.png".to_string(), Some("Y")),
            ],
            ..CrawlOutput::default()
        };

        let mut buffer = Vec::new();
        output.write_images_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(
            text,
            "Page URL,Image URL,Alt Text,Alt Missing\n\
             https://example.test/,https://example.test/x.png,,True\n\
             https://example.test/,https://example.test/y.png,Y,False\n"
        );
    }
}
