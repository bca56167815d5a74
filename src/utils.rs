//! Small text, URL and DOM helpers shared by the extractor and scrapers.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` bytes (backing off to a char boundary) with
/// an ellipsis and the number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Length in characters, not bytes. Length thresholds on titles and
/// descriptions count what a reader sees.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// All text below `element`, concatenated and trimmed.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Whether `s` is an absolute `http(s)` URL.
pub fn is_absolute_http(s: &str) -> bool {
    Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Resolve a possibly relative or protocol-relative `href` against `base`.
pub fn resolve_against(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(|u| u.to_string())
}

/// The first URL in a `srcset` attribute: everything before the first comma,
/// then before the first space.
pub fn first_srcset_candidate(srcset: &str) -> &str {
    let first = srcset.split(',').next().unwrap_or("").trim();
    first.split(' ').next().unwrap_or("")
}

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// The first image below `container`, preferring its `srcset` over `src`.
/// Returns an empty string when there is no image.
pub fn first_image_source(container: &ElementRef<'_>) -> String {
    let Some(img) = container.select(&IMG).next() else {
        return String::new();
    };
    match img.value().attr("srcset").map(str::trim) {
        Some(srcset) if !srcset.is_empty() => first_srcset_candidate(srcset).to_string(),
        _ => img.value().attr("src").unwrap_or("").to_string(),
    }
}

/// Whether the lower-cased `text` contains `needle` ignoring case.
pub fn contains_ignore_case(text: &str, needle: &str) -> bool {
    text.to_lowercase().contains(&needle.to_lowercase())
}
