use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META: LazyLock<Selector> = LazyLock::new(|| selector("meta[name]"));
static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static H2: LazyLock<Selector> = LazyLock::new(|| selector("h2"));
static IMG: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// An `<img>` element as written in the markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub src: Option<String>,
    pub alt: Option<String>,
}

/// On-page SEO signals; absent elements leave empty strings and zero counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlSignals {
    pub title: String,
    pub meta_description: String,
    pub meta_keywords: String,
    pub h1_count: usize,
    pub h1_text: String,
    pub h2_count: usize,
    /// Raw `href` values in document order
    pub links: Vec<String>,
    pub images: Vec<RawImage>,
}

/// Parses an HTML document into its SEO signals
pub fn parse(html: &str) -> HtmlSignals {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&TITLE)
        .next()
        .map(|el| trimmed_text(&el))
        .unwrap_or_default();

    let mut h1s = doc.select(&H1);
    let h1_text = h1s.next().map(|el| trimmed_text(&el));
    let h1_count = h1_text.iter().count() + h1s.count();

    let links = doc
        .select(&ANCHOR)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.to_string())
        .collect::<Vec<String>>();

    let images = doc
        .select(&IMG)
        .map(|e| RawImage {
            src: e.value().attr("src").map(str::to_string),
            alt: e.value().attr("alt").map(str::to_string),
        })
        .collect::<Vec<_>>();

    ::log::trace!(
        "HTML parser found {} links and {} images",
        links.len(),
        images.len()
    );

    HtmlSignals {
        title,
        meta_description: meta_content(&doc, "description"),
        meta_keywords: meta_content(&doc, "keywords"),
        h1_count,
        h1_text: h1_text.unwrap_or_default(),
        h2_count: doc.select(&H2).count(),
        links,
        images,
    }
}

/// Content of the first `<meta name=...>` with the given name and a content attribute
fn meta_content(doc: &Html, name: &str) -> String {
    doc.select(&META)
        .filter(|e| {
            e.value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .find_map(|e| e.value().attr("content"))
        .map(str::to_string)
        .unwrap_or_default()
}

fn trimmed_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
