//! Topic section pages (`/news/technology`, `/sport`, ...).
//!
//! These pages have no stable card markup, so articles are found from their
//! links: anchors whose href fits the topic's [`LinkPattern`], titled from
//! the anchor text or nearby headings, then filtered for navigation chrome
//! and duplicates.

use super::ListingStrategy;
use super::topics::{BROAD_PATTERN, LinkPattern, TopicFamily};
use crate::models::ArticleStub;
use crate::utils::{char_len, element_text, first_image_source, resolve_against};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Anchor text must be longer than this to serve as a title on its own.
const MIN_LINK_TEXT: usize = 10;
/// Derived titles this short or shorter are section labels, not headlines.
const MIN_TITLE: usize = 15;
/// How far up from the anchor to look for a title.
const TITLE_SEARCH_DEPTH: usize = 3;

/// Lower-cased titles containing any of these are navigation, promos or
/// media, not articles.
const NAVIGATION_MARKERS: [&str; 8] = [
    "video", "more", "also in", "only from", "insight", "live", "watch", "listen",
];

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h2, h3").unwrap());
static SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

#[derive(Debug, Clone)]
pub struct SectionPage {
    pub family: TopicFamily,
    pub site_root: Url,
    pub max_results: usize,
}

impl SectionPage {
    pub fn new(section_url: &str, site_root: Url, max_results: usize) -> Self {
        Self {
            family: TopicFamily::from_section_url(section_url),
            site_root,
            max_results,
        }
    }

    fn candidate_anchors<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let by_pattern = |pattern: LinkPattern| -> Vec<ElementRef<'a>> {
            document
                .select(&ANCHOR)
                .filter(|a| a.value().attr("href").is_some_and(|href| pattern.matches(href)))
                .collect()
        };
        let anchors = by_pattern(self.family.link_pattern());
        if !anchors.is_empty() {
            return anchors;
        }
        debug!(family = ?self.family, "No anchors matched the topic pattern; trying broad pattern");
        by_pattern(BROAD_PATTERN)
    }
}

impl ListingStrategy for SectionPage {
    type Output = Vec<ArticleStub>;

    fn extract(&self, document: &Html, _page_url: &Url) -> Vec<ArticleStub> {
        let mut articles = Vec::new();
        let mut seen_titles = HashSet::new();

        for anchor in self.candidate_anchors(document) {
            if articles.len() >= self.max_results {
                break;
            }

            let title = derive_title(&anchor);
            if char_len(&title) <= MIN_TITLE
                || seen_titles.contains(&title)
                || is_navigation(&title)
            {
                continue;
            }

            let href = anchor.value().attr("href").unwrap_or("");
            let Some(link) = resolve_against(&self.site_root, href) else {
                debug!(href, "Unresolvable href");
                continue;
            };

            let parent = anchor.parent().and_then(ElementRef::wrap);
            let summary = parent
                .and_then(|p| p.select(&PARAGRAPH).next())
                .map(|p| element_text(&p))
                .unwrap_or_default();
            let image = parent
                .map(|p| first_image_source(&p))
                .filter(|src| !src.is_empty())
                .and_then(|src| resolve_against(&self.site_root, &src))
                .unwrap_or_default();

            if let Some(stub) = ArticleStub::new(&title, &summary, &link, &image) {
                seen_titles.insert(title);
                articles.push(stub);
            }
        }
        articles
    }
}

/// The anchor's own text when it is long enough, otherwise the first heading,
/// long span or long paragraph found within the nearest ancestors.
fn derive_title(anchor: &ElementRef<'_>) -> String {
    let text = element_text(anchor);
    if char_len(&text) > MIN_LINK_TEXT {
        return text;
    }

    for ancestor in anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(TITLE_SEARCH_DEPTH)
    {
        if let Some(heading) = ancestor.select(&HEADING).next() {
            let heading = element_text(&heading);
            if !heading.is_empty() {
                return heading;
            }
        }
        let long_text = |selector: &Selector| {
            ancestor
                .select(selector)
                .next()
                .map(|el| element_text(&el))
                .filter(|t| char_len(t) > MIN_LINK_TEXT)
        };
        if let Some(span) = long_text(&SPAN) {
            return span;
        }
        if let Some(p) = long_text(&PARAGRAPH) {
            return p;
        }
    }
    String::new()
}

fn is_navigation(title: &str) -> bool {
    let lower = title.to_lowercase();
    NAVIGATION_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(url: &str, html: &str, max: usize) -> Vec<ArticleStub> {
        let page = SectionPage::new(url, Url::parse("https://www.bbc.com").unwrap(), max);
        page.extract(&Html::parse_document(html), &Url::parse(url).unwrap())
    }

    const TECH: &str = "https://www.bbc.com/news/technology";

    #[test]
    fn test_anchor_text_title_and_parent_fields() {
        let html = r#"<ul><li>
            <a href="/news/articles/c0000000001">Chipmaker unveils faster processors for laptops</a>
            <p>The new chips promise longer battery life.</p>
            <img src="/x.jpg" srcset="https://ichef.bbci.co.uk/240/chip.jpg 240w, https://ichef.bbci.co.uk/480/chip.jpg 480w">
        </li></ul>"#;
        let stubs = extract(TECH, html, 10);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].title, "Chipmaker unveils faster processors for laptops");
        assert_eq!(stubs[0].link, "https://www.bbc.com/news/articles/c0000000001");
        assert_eq!(stubs[0].summary, "The new chips promise longer battery life.");
        assert_eq!(stubs[0].image_hint, "https://ichef.bbci.co.uk/240/chip.jpg");
    }

    #[test]
    fn test_title_from_ancestor_heading() {
        let html = r#"<div class="promo">
            <div class="media"><a href="/news/articles/c0000000002"><img src="/p.jpg"></a></div>
            <h3>Regulators open inquiry into app store fees</h3>
        </div>"#;
        let stubs = extract(TECH, html, 10);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].title, "Regulators open inquiry into app store fees");
    }

    #[test]
    fn test_title_from_span_when_no_heading() {
        let html = r#"<div><a href="/news/articles/c0000000003">Read</a>
            <span>Startup raises record funding round for robots</span></div>"#;
        let stubs = extract(TECH, html, 10);
        assert_eq!(stubs[0].title, "Startup raises record funding round for robots");
    }

    #[test]
    fn test_duplicate_titles_kept_once() {
        let html = r#"
            <a href="/news/articles/c0000000004">Satellite broadband reaches remote islands</a>
            <a href="/news/articles/c0000000005">  Satellite broadband reaches remote islands  </a>"#;
        let stubs = extract(TECH, html, 10);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].link, "https://www.bbc.com/news/articles/c0000000004");
    }

    #[test]
    fn test_navigation_and_short_titles_discarded() {
        let html = r#"
            <a href="/sport/football/articles/c001">Watch: Highlights from the match</a>
            <a href="/sport/football/articles/c002">Live: Premier League</a>
            <a href="/sport/football/articles/c003">Scores 2024</a>
            <a href="/sport/football/articles/c004">Striker signs four-year contract extension</a>"#;
        let stubs = extract("https://www.bbc.com/sport", html, 10);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].title, "Striker signs four-year contract extension");
    }

    #[test]
    fn test_title_length_boundary() {
        // 15 characters is too short, 16 is enough.
        let html = r#"
            <a href="/news/articles/c0000000006">Fifteen chars!!</a>
            <a href="/news/articles/c0000000007">Sixteen chars!!!</a>"#;
        let stubs = extract(TECH, html, 10);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].title, "Sixteen chars!!!");
    }

    #[test]
    fn test_max_results_bound() {
        let html = (1..=5)
            .map(|i| format!(r#"<a href="/news/articles/c00000000{i:02}">Story number {i} about quantum computing</a>"#))
            .collect::<String>();
        let stubs = extract(TECH, &html, 3);
        assert_eq!(stubs.len(), 3);
        assert_eq!(stubs[2].title, "Story number 3 about quantum computing");
    }

    #[test]
    fn test_broad_pattern_fallback() {
        let html = r#"<a href="https://www.bbc.com/news/uk-politics-68123456">Minister sets out plans for rail reform</a>"#;
        let stubs = extract("https://www.bbc.com/news/health", html, 10);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].link, "https://www.bbc.com/news/uk-politics-68123456");
    }

    #[test]
    fn test_non_matching_links_ignored() {
        let html = r#"<a href="/weather">Weather forecast for the week ahead</a>"#;
        assert!(extract(TECH, html, 10).is_empty());
    }
}
