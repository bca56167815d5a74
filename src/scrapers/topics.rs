//! Topic families: which listing page serves a topic, and which anchors on
//! that page are article links.
//!
//! Section pages link to far more than articles (navigation, live pages,
//! other sections), so each family accepts only hrefs that carry its path
//! marker and are long enough to be an article slug.

use crate::utils::char_len;
use url::Url;

/// Heuristic for recognizing article links by their `href`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPattern {
    /// At least one of these must appear in the href.
    pub needles: &'static [&'static str],
    /// The href must be strictly longer than this, in characters.
    pub min_len: usize,
    pub require_digit: bool,
}

impl LinkPattern {
    pub fn matches(&self, href: &str) -> bool {
        char_len(href) > self.min_len
            && self.needles.iter().any(|needle| href.contains(needle))
            && (!self.require_digit || href.chars().any(|c| c.is_ascii_digit()))
    }
}

/// Used when a page yields no anchor matching its family's pattern.
pub const BROAD_PATTERN: LinkPattern = LinkPattern {
    needles: &["/news/", "/sport/"],
    min_len: 30,
    require_digit: true,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicFamily {
    Sport,
    Technology,
    Science,
    Business,
    Politics,
    World,
    Health,
    Entertainment,
    Generic,
}

impl TopicFamily {
    /// Classify a listing-page URL. Checked in a fixed order, first hit wins.
    pub fn from_section_url(url: &str) -> Self {
        const MARKERS: [(&str, TopicFamily); 8] = [
            ("/sport", TopicFamily::Sport),
            ("/news/technology", TopicFamily::Technology),
            ("/news/science", TopicFamily::Science),
            ("/news/business", TopicFamily::Business),
            ("/news/politics", TopicFamily::Politics),
            ("/news/world", TopicFamily::World),
            ("/news/health", TopicFamily::Health),
            ("/news/entertainment", TopicFamily::Entertainment),
        ];
        MARKERS
            .iter()
            .find(|(marker, _)| url.contains(marker))
            .map(|(_, family)| *family)
            .unwrap_or(TopicFamily::Generic)
    }

    pub fn link_pattern(&self) -> LinkPattern {
        let needles: &'static [&'static str] = match self {
            TopicFamily::Sport => {
                return LinkPattern {
                    needles: &["/sport/"],
                    min_len: 20,
                    require_digit: true,
                };
            }
            TopicFamily::Technology => &["/news/technology/", "/news/articles/"],
            TopicFamily::Science => &["/news/science", "/news/articles/"],
            TopicFamily::Business => &["/news/business/", "/news/articles/"],
            TopicFamily::Politics => &["/news/politics/", "/news/articles/"],
            TopicFamily::World => &["/news/world/", "/news/articles/"],
            TopicFamily::Health => &["/news/health/", "/news/articles/"],
            TopicFamily::Entertainment => &["/news/entertainment", "/news/articles/"],
            TopicFamily::Generic => &["/news/articles/", "/sport/"],
        };
        LinkPattern {
            needles,
            min_len: 20,
            require_digit: false,
        }
    }
}

/// Path of the listing page that covers `topic`, relative to the site root.
/// Unknown topics get the general news index.
pub fn section_path_for_topic(topic: &str) -> &'static str {
    match topic.trim().to_lowercase().as_str() {
        "technology" => "/news/technology",
        "science" => "/news/science_and_environment",
        "business" | "stock_market" => "/news/business",
        "politics" => "/news/politics",
        "world" | "geopolitics" | "food" | "defense" => "/news/world",
        "health" => "/news/health",
        "entertainment" => "/news/entertainment_and_arts",
        "sports" => "/sport",
        _ => "/news",
    }
}

/// Absolute listing URL for `topic` under `site_root`.
pub fn section_url_for_topic(site_root: &Url, topic: &str) -> String {
    let path = section_path_for_topic(topic);
    site_root
        .join(path)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}{path}", site_root.as_str().trim_end_matches('/')))
}
