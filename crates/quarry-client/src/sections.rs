//! Pulling structured pieces out of posting description HTML.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

pub const SHORT_DESCRIPTION_CHARS: usize = 200;

static LIST_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul, ol").expect("list selector"));
static ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("item selector"));
static REQUIREMENT_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)requirement|qualification|what you.ll need|you (?:have|bring)|about you")
        .expect("requirement heading regex")
});
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Bullet items listed under a requirements/qualifications heading,
/// one per line. `None` when the description has no such section.
pub fn requirement_items(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);

    let items: Vec<String> = fragment
        .select(&LIST_SELECTOR)
        .filter(|list| {
            preceding_heading(*list).is_some_and(|text| REQUIREMENT_HEADING.is_match(&text))
        })
        .flat_map(|list| list.select(&ITEM_SELECTOR).map(element_text).collect::<Vec<_>>())
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items.join("\n"))
    }
}

/// Text of the closest preceding sibling element, e.g. the `<h3>` or
/// `<p><b>` introducing a list.
fn preceding_heading(list: ElementRef<'_>) -> Option<String> {
    list.prev_siblings()
        .find_map(ElementRef::wrap)
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// First `max_chars` characters of `text` with whitespace collapsed.
pub fn summarize(text: &str, max_chars: usize) -> String {
    collapse_whitespace(text).chars().take(max_chars).collect()
}

/// Greenhouse returns `content` with its HTML entity-escaped.
pub fn unescape_html(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
