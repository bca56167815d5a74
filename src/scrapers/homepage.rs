//! The English front page.
//!
//! The current front page is built from test-id tagged components: a
//! `*-section` container holds a `*-title-wrapper` heading and a run of
//! `*-card` blocks, each card exposing `card-headline` and
//! `card-description` roles.

use super::ListingStrategy;
use crate::models::{ArticleStub, Sections};
use crate::utils::{element_text, first_image_source, resolve_against};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Section name used when a container has no title of its own.
pub const FALLBACK_SECTION: &str = "Latest";
const MAX_CARDS_PER_SECTION: usize = 8;

static SECTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"section[data-testid$="-section"], div[data-testid$="-section"]"#).unwrap()
});
static TITLE_WRAPPER: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"h2[data-testid$="-title-wrapper"], div[data-testid$="-title-wrapper"]"#)
        .unwrap()
});
static H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[data-testid$="-card"]"#).unwrap());
static HEADLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"h2[data-testid="card-headline"]"#).unwrap());
static DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"p[data-testid="card-description"]"#).unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

#[derive(Debug, Clone)]
pub struct FrontPage {
    pub site_root: Url,
    /// Stop after the first section container, even when it has no cards.
    pub latest_only: bool,
}

impl ListingStrategy for FrontPage {
    type Output = Sections;

    fn extract(&self, document: &Html, _page_url: &Url) -> Sections {
        let mut sections = Sections::new();
        for container in document.select(&SECTION) {
            let name = section_title(&container);
            let articles: Vec<ArticleStub> = container
                .select(&CARD)
                .take(MAX_CARDS_PER_SECTION)
                .filter_map(|card| self.card_stub(&card))
                .collect();
            debug!(section = %name, cards = articles.len(), "Parsed front-page section");
            sections.insert(name, articles);

            if self.latest_only {
                break;
            }
        }
        sections
    }
}

impl FrontPage {
    fn card_stub(&self, card: &ElementRef<'_>) -> Option<ArticleStub> {
        let text_of = |selector: &Selector| {
            card.select(selector)
                .next()
                .map(|el| element_text(&el))
                .unwrap_or_default()
        };
        let title = text_of(&HEADLINE);
        if title.is_empty() {
            return None;
        }
        let summary = text_of(&DESCRIPTION);
        let image = first_image_source(card);
        let href = card
            .select(&LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .filter(|href| !href.trim().is_empty());
        let Some(link) = href.and_then(|href| resolve_against(&self.site_root, href)) else {
            debug!(%title, "Card has no usable link");
            return None;
        };
        ArticleStub::new(&title, &summary, &link, &image)
    }
}

fn section_title(container: &ElementRef<'_>) -> String {
    let Some(wrapper) = container.select(&TITLE_WRAPPER).next() else {
        return FALLBACK_SECTION.to_string();
    };
    let heading = if wrapper.value().name() == "h2" {
        Some(wrapper)
    } else {
        wrapper.select(&H2).next()
    };
    heading
        .map(|h| element_text(&h))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_SECTION.to_string())
}
