pub mod html;


use crate::crawlers::fetch::FetchedPage;
use crate::filter::UrlFilter;
use crate::results::{ImageRecord, PageRecord};
use url::Url;

/// Enum to represent the content parsers a response can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserType {
    /// HTML parser
    Html,
    /// Anything else: metadata only, no signals or links
    Other,
}

impl ParserType {
    /// Determines the parser type from the Content-Type header; an absent header means HTML
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "" | "text/html" | "application/xhtml+xml" => ParserType::Html,
            _ => {
                ::log::debug!("Not parsing content of type {}", content_type);
                ParserType::Other
            }
        }
    }
}

/// Result of extracting one fetched page
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: PageRecord,
    /// In-scope links in document order, not yet checked against the frontier
    pub links: Vec<Url>,
    pub images: Vec<ImageRecord>,
}

/// Builds the page record, its image records, and its in-scope outbound links
pub fn extract(page: &FetchedPage, filter: &UrlFilter) -> Extraction {
    let page_url = page.final_url.as_str();

    let signals = match ParserType::from_content_type(&page.content_type) {
        ParserType::Html => html::parse(&String::from_utf8_lossy(&page.body)),
        ParserType::Other => html::HtmlSignals::default(),
    };

    let images: Vec<ImageRecord> = signals
        .images
        .iter()
        .map(|image| {
            let image_url = image
                .src
                .as_deref()
                .map(|src| resolve_image(&page.final_url, src))
                .unwrap_or_default();
            ImageRecord::new(page_url, image_url, image.alt.as_deref())
        })
        .collect();

    let links = signals
        .links
        .iter()
        .filter_map(|href| filter.accept(href, &page.final_url))
        .collect();

    let record = PageRecord {
        url: page_url.to_string(),
        status_code: page.status_code,
        title_length: signals.title.chars().count(),
        title: signals.title,
        meta_description_length: signals.meta_description.chars().count(),
        meta_description: signals.meta_description,
        meta_keywords: signals.meta_keywords,
        h1_count: signals.h1_count,
        h1_text: signals.h1_text,
        h2_count: signals.h2_count,
        response_time_ms: page.elapsed_ms,
        content_type: page.content_type.clone(),
        content_length: page.body.len(),
        images_missing_alt: images
            .iter()
            .filter(|image| image.alt_missing && !image.image_url.is_empty())
            .map(|image| image.image_url.clone())
            .collect(),
        broken_links: Vec::new(),
    };

    Extraction {
        record,
        links,
        images,
    }
}

/// Absolute image URL, or the raw `src` when it cannot be resolved
fn resolve_image(base: &Url, src: &str) -> String {
    match base.join(src.trim()) {
        Ok(url) => url.to_string(),
        Err(_) => src.to_string(),
    }
}
