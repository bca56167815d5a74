//! World Service language editions.
//!
//! Each language front page groups stories into `section[aria-labelledby]`
//! blocks with an `h2` title and a list of `li` promos. English is the
//! exception: it uses the main front page and is handled by
//! [`super::homepage`].

use super::ListingStrategy;
use crate::models::{ArticleStub, Edition, Sections};
use crate::utils::{element_text, first_image_source, resolve_against};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

pub const ENGLISH: &str = "english";
const MAX_ITEMS_PER_SECTION: usize = 5;

/// Language code to front page.
pub const EDITIONS: [(&str, &str); 31] = [
    ("arabic", "https://www.bbc.com/arabic"),
    ("chinese", "https://www.bbc.com/zhongwen/simp"),
    ("indonesian", "https://www.bbc.com/indonesia"),
    ("kyrgyz", "https://www.bbc.com/kyrgyz"),
    ("persian", "https://www.bbc.com/persian"),
    ("somali", "https://www.bbc.com/somali"),
    ("turkish", "https://www.bbc.com/turkce"),
    ("vietnamese", "https://www.bbc.com/vietnamese"),
    ("azeri", "https://www.bbc.com/azeri"),
    ("french", "https://www.bbc.com/afrique"),
    ("japanese", "https://www.bbc.com/japanese"),
    ("marathi", "https://www.bbc.com/marathi"),
    ("portuguese", "https://www.bbc.com/portuguese"),
    ("spanish", "https://www.bbc.com/mundo"),
    ("ukrainian", "https://www.bbc.com/ukrainian"),
    ("bengali", "https://www.bbc.com/bengali"),
    ("hausa", "https://www.bbc.com/hausa"),
    ("kinyarwanda", "https://www.bbc.com/gahuza"),
    ("nepali", "https://www.bbc.com/nepali"),
    ("russian", "https://www.bbc.com/russian"),
    ("swahili", "https://www.bbc.com/swahili"),
    ("urdu", "https://www.bbc.com/urdu"),
    ("burmese", "https://www.bbc.com/burmese"),
    ("hindi", "https://www.bbc.com/hindi"),
    ("kirundi", "https://www.bbc.com/gahuza"),
    ("pashto", "https://www.bbc.com/pashto"),
    ("sinhala", "https://www.bbc.com/sinhala"),
    ("tamil", "https://www.bbc.com/tamil"),
    ("uzbek", "https://www.bbc.com/uzbek"),
    ("english", "https://www.bbc.com"),
    ("yoruba", "https://www.bbc.com/yoruba"),
];

static SECTION: Lazy<Selector> = Lazy::new(|| Selector::parse("section[aria-labelledby]").unwrap());
static H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("h3 a[href]").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Front page URL for a language code, case-insensitive.
pub fn edition_url(code: &str) -> Option<&'static str> {
    let code = code.trim().to_lowercase();
    EDITIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, url)| *url)
}

/// Whether `url` is one of the non-English edition front pages.
pub fn is_edition_url(url: &Url) -> bool {
    let path = url.path().trim_end_matches('/');
    !path.is_empty()
        && EDITIONS.iter().any(|(code, edition)| {
            *code != ENGLISH
                && Url::parse(edition).is_ok_and(|e| e.path().trim_end_matches('/') == path)
        })
}

/// Every supported edition, in table order.
pub fn languages() -> Vec<Edition> {
    EDITIONS
        .iter()
        .map(|(code, url)| {
            let name = capitalize(code);
            Edition {
                code: code.to_string(),
                description: format!("BBC News in {name}"),
                name,
                url: url.to_string(),
            }
        })
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[derive(Debug, Clone)]
pub struct EditionPage {
    /// Stop after the first titled section, even when none of its items
    /// has a link.
    pub latest_only: bool,
}

impl ListingStrategy for EditionPage {
    type Output = Sections;

    fn extract(&self, document: &Html, page_url: &Url) -> Sections {
        let mut sections = Sections::new();
        for container in document.select(&SECTION) {
            let Some(name) = container
                .select(&H2)
                .next()
                .map(|h| element_text(&h))
                .filter(|t| !t.is_empty())
            else {
                continue;
            };

            let articles: Vec<ArticleStub> = container
                .select(&ITEM)
                .take(MAX_ITEMS_PER_SECTION)
                .filter_map(|item| {
                    let anchor = item.select(&TITLE_LINK).next()?;
                    let link = resolve_against(page_url, anchor.value().attr("href")?)?;
                    let summary = item
                        .select(&PARAGRAPH)
                        .next()
                        .map(|p| element_text(&p))
                        .unwrap_or_default();
                    let image = first_image_source(&item);
                    ArticleStub::new(&element_text(&anchor), &summary, &link, &image)
                })
                .collect();
            debug!(section = %name, items = articles.len(), "Parsed edition section");
            sections.insert(name, articles);

            if self.latest_only {
                break;
            }
        }
        sections
    }
}
