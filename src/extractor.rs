//! Representative image and body text extraction for article pages.
//!
//! Both operations degrade instead of failing: a page without a usable image
//! yields an empty string, a page without recoverable text yields a
//! placeholder paragraph pointing the reader at the source.
//!
//! # Image priority
//!
//! 1. `og:image` meta content, when absolute
//! 2. `twitter:image` meta content, when absolute
//! 3. First `<img>` declaring width ≥ 200 and height ≥ 150
//! 4. First undimensioned `<img>` whose source looks like content
//!    (`article`, `content`, `photo`)

use crate::cache::MemoCache;
use crate::config::Timeouts;
use crate::http::{Fetcher, HeaderProfile};
use crate::models::ArticleBody;
use crate::resolver::Resolver;
use crate::utils::{element_text, html_escape, is_absolute_http, resolve_against};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

const MIN_IMAGE_WIDTH: u32 = 200;
const MIN_IMAGE_HEIGHT: u32 = 150;
const CONTENT_IMAGE_TOKENS: [&str; 3] = ["article", "content", "photo"];

/// Shown when the page was fetched but no paragraph text was found.
pub const CONTENT_UNAVAILABLE: &str = concat!(
    "<p>The full article content is currently inaccessible. ",
    "This could be due to access restrictions or technical issues. ",
    "For the complete story, please visit the original source.</p>"
);

/// Shown when the page could not be fetched at all.
pub const EXTRACTION_FAILED: &str = concat!(
    "<p>Unable to extract article content. ",
    "Please visit the original article for the full story.</p>"
);

/// Body selectors, newest page template first. The first one that yields a
/// non-empty paragraph wins; tiers are never merged.
const BODY_SELECTORS: [&str; 6] = [
    r#"div[data-component="text-block"] p"#,
    r#"div[data-component="text"] p"#,
    ".article__body p",
    ".story-body p",
    ".story-body__inner p",
    r#"[data-component="text-block"] p"#,
];

static OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());
static TWITTER_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="twitter:image"]"#).unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static BODY_TIERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    BODY_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static MAIN_CONTAINERS: Lazy<[Selector; 3]> = Lazy::new(|| {
    [
        Selector::parse("main").unwrap(),
        Selector::parse("article").unwrap(),
        Selector::parse("div.article").unwrap(),
    ]
});

/// Fetches article pages and pulls out their image and body text.
///
/// Image results are memoized per article URL; body extraction always
/// fetches.
pub struct ContentExtractor<F> {
    fetcher: Arc<F>,
    resolver: Resolver<F>,
    images: MemoCache,
    timeouts: Timeouts,
}

impl<F: Fetcher> ContentExtractor<F> {
    /// # Arguments
    ///
    /// * `fetcher` - Network access
    /// * `resolver` - Used to canonicalize links before image lookups
    /// * `images` - Memo table keyed by the article URL as given
    /// * `timeouts` - Image page and article body budgets
    pub fn new(
        fetcher: Arc<F>,
        resolver: Resolver<F>,
        images: MemoCache,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            images,
            timeouts,
        }
    }

    pub fn resolver(&self) -> &Resolver<F> {
        &self.resolver
    }

    /// Representative image for `article_url`, or an empty string.
    ///
    /// Aggregator links are resolved first. The result, empty or not, is
    /// cached against `article_url` as given.
    #[instrument(level = "info", skip(self))]
    pub async fn extract_image(&self, article_url: &str) -> String {
        if article_url.trim().is_empty() {
            return String::new();
        }
        self.images
            .get_or_compute(article_url, self.find_image(article_url))
            .await
    }

    async fn find_image(&self, article_url: &str) -> String {
        let real_url = self.resolver.resolve(article_url).await;
        let page = match self
            .fetcher
            .get(&real_url, HeaderProfile::Browser, self.timeouts.image_page())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                warn!(%real_url, error = %e, "Article fetch failed");
                return String::new();
            }
        };
        if !page.is_success() {
            info!(%real_url, status = page.status, "Article page returned non-success status");
            return String::new();
        }
        let image = image_from_html(&page.body, &page.final_url).unwrap_or_default();
        if image.is_empty() {
            info!(%real_url, "No image found");
        } else {
            debug!(%real_url, %image, "Found image");
        }
        image
    }

    /// Body paragraphs as escaped HTML plus the `og:image`, fetched directly
    /// from `article_url`.
    #[instrument(level = "info", skip(self))]
    pub async fn extract_body(&self, article_url: &str) -> ArticleBody {
        let page = match self
            .fetcher
            .get(article_url, HeaderProfile::Basic, self.timeouts.article_body())
            .await
        {
            Ok(page) if page.is_success() => page,
            Ok(page) => {
                warn!(status = page.status, "Article body fetch returned non-success status");
                return failed_body();
            }
            Err(e) => {
                warn!(error = %e, "Article body fetch failed");
                return failed_body();
            }
        };
        let body = body_from_html(&page.body);
        info!(
            bytes = body.content.len(),
            has_image = !body.image.is_empty(),
            "Extracted article body"
        );
        body
    }
}

fn failed_body() -> ArticleBody {
    ArticleBody {
        content: EXTRACTION_FAILED.to_string(),
        image: String::new(),
    }
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn absolute_meta(document: &Html, selector: &Selector) -> Option<String> {
    meta_content(document, selector).filter(|content| is_absolute_http(content))
}

/// Declared `width`/`height`, or `None` when either is missing or not a
/// plain integer.
fn declared_dimensions(img: &ElementRef<'_>) -> Option<(u32, u32)> {
    let width = img.value().attr("width")?.trim().parse().ok()?;
    let height = img.value().attr("height")?.trim().parse().ok()?;
    Some((width, height))
}

/// Run the image priority chain over a fetched page.
///
/// # Arguments
///
/// * `html` - The article page markup
/// * `page_url` - Final URL of the page; relative `<img>` sources resolve
///   against it
///
/// # Returns
///
/// The first absolute image URL found by the priority chain in the module
/// docs, or `None`.
///
/// # Examples
///
/// ```ignore
/// let html = r#"<img src="/photos/lead.jpg" width="640" height="360">"#;
/// let url = Url::parse("https://www.bbc.com/news/articles/c1")?;
/// assert_eq!(
///     image_from_html(html, &url).as_deref(),
///     Some("https://www.bbc.com/photos/lead.jpg")
/// );
/// ```
pub fn image_from_html(html: &str, page_url: &Url) -> Option<String> {
    let document = Html::parse_document(html);

    if let Some(og) = absolute_meta(&document, &OG_IMAGE) {
        return Some(og);
    }
    if let Some(twitter) = absolute_meta(&document, &TWITTER_IMAGE) {
        return Some(twitter);
    }

    let images: Vec<(ElementRef<'_>, &str)> = document
        .select(&IMG)
        .filter_map(|img| {
            let src = img.value().attr("src")?.trim();
            (!src.is_empty()).then_some((img, src))
        })
        .collect();

    let sized = images
        .iter()
        .filter(|(img, _)| {
            declared_dimensions(img)
                .is_some_and(|(w, h)| w >= MIN_IMAGE_WIDTH && h >= MIN_IMAGE_HEIGHT)
        })
        .find_map(|(_, src)| resolve_against(page_url, src));
    if sized.is_some() {
        return sized;
    }

    images
        .iter()
        .filter(|(img, _)| declared_dimensions(img).is_none())
        .find(|(_, src)| {
            let lower = src.to_lowercase();
            CONTENT_IMAGE_TOKENS.iter().any(|token| lower.contains(token))
        })
        .and_then(|(_, src)| resolve_against(page_url, src))
}

/// Extract paragraphs and `og:image` from a fetched article page.
pub fn body_from_html(html: &str) -> ArticleBody {
    let document = Html::parse_document(html);
    let image = absolute_meta(&document, &OG_IMAGE).unwrap_or_default();

    let paragraphs =
        tiered_paragraphs(&document).unwrap_or_else(|| container_paragraphs(&document));

    let content = if paragraphs.is_empty() {
        CONTENT_UNAVAILABLE.to_string()
    } else {
        format!(
            "<div>{}</div>",
            paragraphs
                .iter()
                .map(|p| format!("<p>{}</p>", html_escape(p)))
                .join("")
        )
    };
    ArticleBody { content, image }
}

fn non_empty_texts<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
        .collect()
}

fn tiered_paragraphs(document: &Html) -> Option<Vec<String>> {
    BODY_TIERS.iter().enumerate().find_map(|(tier, selector)| {
        let texts = non_empty_texts(document.select(selector));
        if texts.is_empty() {
            return None;
        }
        debug!(
            tier,
            selector = BODY_SELECTORS[tier],
            paragraphs = texts.len(),
            "Body selector matched"
        );
        Some(texts)
    })
}

fn container_paragraphs(document: &Html) -> Vec<String> {
    MAIN_CONTAINERS
        .iter()
        .find_map(|selector| document.select(selector).next())
        .map(|container| non_empty_texts(container.select(&PARAGRAPH)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::StubFetcher;

    const PAGE: &str = "https://www.bbc.com/news/articles/c1";

    fn page_url() -> Url {
        Url::parse(PAGE).unwrap()
    }

    fn extractor(fetcher: StubFetcher) -> (Arc<StubFetcher>, ContentExtractor<StubFetcher>) {
        let fetcher = Arc::new(fetcher);
        let resolver = Resolver::new(
            Arc::clone(&fetcher),
            MemoCache::new("resolved_urls", 64, None),
            "news.google.com",
            Timeouts::default(),
        );
        let extractor = ContentExtractor::new(
            Arc::clone(&fetcher),
            resolver,
            MemoCache::new("images", 64, None),
            Timeouts::default(),
        );
        (fetcher, extractor)
    }

    #[test]
    fn test_og_image_wins() {
        let html = r#"<html><head>
            <meta name="twitter:image" content="https://i.bbc/twitter.jpg">
            <meta property="og:image" content="https://i.bbc/og.jpg">
            </head><body><img src="/big.jpg" width="800" height="600"></body></html>"#;
        assert_eq!(image_from_html(html, &page_url()).as_deref(), Some("https://i.bbc/og.jpg"));
    }

    #[test]
    fn test_relative_og_image_falls_through_to_twitter() {
        let html = r#"<head>
            <meta property="og:image" content="/relative/og.jpg">
            <meta name="twitter:image" content="https://i.bbc/twitter.jpg">
            </head>"#;
        assert_eq!(
            image_from_html(html, &page_url()).as_deref(),
            Some("https://i.bbc/twitter.jpg")
        );
    }

    #[test]
    fn test_dimension_threshold_is_inclusive() {
        let html = r#"<body><img src="/icons/logo.png" width="200" height="150"></body>"#;
        assert_eq!(
            image_from_html(html, &page_url()).as_deref(),
            Some("https://www.bbc.com/icons/logo.png")
        );
    }

    #[test]
    fn test_narrow_or_short_images_fall_through() {
        let html = r#"<body>
            <img src="/a.png" width="199" height="150">
            <img src="/b.png" width="200" height="149">
            <img src="//ichef.bbci.co.uk/photo/lead.jpg">
            </body>"#;
        assert_eq!(
            image_from_html(html, &page_url()).as_deref(),
            Some("https://ichef.bbci.co.uk/photo/lead.jpg")
        );

        let html = r#"<body><img src="/a.png" width="199" height="150"></body>"#;
        assert_eq!(image_from_html(html, &page_url()), None);
    }

    #[test]
    fn test_sized_image_beats_earlier_content_image() {
        let html = r#"<body>
            <img src="/content/thumb.jpg">
            <img src="hero.jpg" width="640" height="360">
            </body>"#;
        assert_eq!(
            image_from_html(html, &page_url()).as_deref(),
            Some("https://www.bbc.com/news/articles/hero.jpg")
        );
    }

    #[test]
    fn test_unparseable_dimensions_count_as_missing() {
        let html = r#"<body><img src="/Article-Images/lead.jpg" width="100%" height="auto"></body>"#;
        assert_eq!(
            image_from_html(html, &page_url()).as_deref(),
            Some("https://www.bbc.com/Article-Images/lead.jpg")
        );
    }

    #[test]
    fn test_no_image() {
        assert_eq!(image_from_html("<body><img src='/logo.svg'></body>", &page_url()), None);
    }

    #[test]
    fn test_body_first_matching_tier_only() {
        let html = r#"<body>
            <div data-component="text-block"><p>First paragraph.</p><p>  </p><p>Second &amp; last.</p></div>
            <div class="story-body"><p>Legacy text that must not be merged.</p></div>
            <meta property="og:image" content="https://i.bbc/og.jpg">
            </body>"#;
        let body = body_from_html(html);
        assert_eq!(
            body.content,
            "<div><p>First paragraph.</p><p>Second &amp; last.</p></div>"
        );
        assert_eq!(body.image, "https://i.bbc/og.jpg");
    }

    #[test]
    fn test_body_skips_tier_with_only_empty_paragraphs() {
        let html = r#"<body>
            <div data-component="text-block"><p> </p></div>
            <div class="story-body"><p>Legacy <b>template</b> text.</p></div>
            </body>"#;
        assert_eq!(body_from_html(html).content, "<div><p>Legacy template text.</p></div>");
    }

    #[test]
    fn test_body_escapes_text() {
        let html = r#"<div class="article__body"><p>Use &lt;script&gt; wisely</p></div>"#;
        assert_eq!(
            body_from_html(html).content,
            "<div><p>Use &lt;script&gt; wisely</p></div>"
        );
    }

    #[test]
    fn test_body_main_container_fallback() {
        let html = r#"<body><nav><p>Menu</p></nav><main><p>Only main text.</p></main></body>"#;
        assert_eq!(body_from_html(html).content, "<div><p>Only main text.</p></div>");
    }

    #[test]
    fn test_body_placeholder_when_empty() {
        let body = body_from_html("<body><div>No paragraphs here</div></body>");
        assert_eq!(body.content, CONTENT_UNAVAILABLE);
        assert_eq!(body.image, "");
    }

    #[test]
    fn test_body_article_container_fallback() {
        let html = r#"<body><aside><p>Related</p></aside><article><p>Article text.</p></article></body>"#;
        assert_eq!(body_from_html(html).content, "<div><p>Article text.</p></div>");
    }

    #[test]
    fn test_body_div_article_container_fallback() {
        let html = r#"<body><div class="sidebar"><p>Promo</p></div><div class="article"><p>Div text.</p></div></body>"#;
        assert_eq!(body_from_html(html).content, "<div><p>Div text.</p></div>");
    }

    #[test]
    fn test_body_main_preferred_over_article() {
        let html = r#"<body><article><p>Article text.</p></article><main><p>Main text.</p></main></body>"#;
        assert_eq!(body_from_html(html).content, "<div><p>Main text.</p></div>");
    }

    #[test]
    fn test_unjoinable_sized_image_falls_through_to_content_token() {
        let html = r#"<body>
            <img src="http://[broken" width="800" height="600">
            <img src="/photo/lead.jpg">
            </body>"#;
        assert_eq!(
            image_from_html(html, &page_url()),
            Some("https://www.bbc.com/photo/lead.jpg".to_string())
        );
    }

    #[tokio::test]
    async fn test_extract_body_non_success_status_placeholder() {
        let (fetcher, extractor) = extractor(StubFetcher::new().status(PAGE, 404));
        let body = extractor.extract_body(PAGE).await;
        assert_eq!(body.content, EXTRACTION_FAILED);
        assert_eq!(body.image, "");
        assert_eq!(fetcher.get_count(PAGE), 1);
    }

    #[tokio::test]
    async fn test_extract_body_fetch_failure_placeholder() {
        let (_, extractor) = extractor(StubFetcher::new().failing(PAGE));
        let body = extractor.extract_body(PAGE).await;
        assert_eq!(body.content, EXTRACTION_FAILED);
        assert_eq!(body.image, "");
    }

    #[tokio::test]
    async fn test_extract_image_resolves_aggregator_link_first() {
        let link = "https://news.google.com/rss/articles/CBMiXyz?oc=5";
        let (fetcher, extractor) = extractor(
            StubFetcher::new()
                .redirect(link, PAGE, 200, "")
                .page(PAGE, r#"<meta property="og:image" content="https://i.bbc/og.jpg">"#),
        );
        assert_eq!(extractor.extract_image(link).await, "https://i.bbc/og.jpg");
        assert_eq!(extractor.extract_image(link).await, "https://i.bbc/og.jpg");
        assert_eq!(fetcher.get_count(PAGE), 1);
        assert_eq!(fetcher.get_count(link), 1);
    }

    #[tokio::test]
    async fn test_extract_image_caches_empty_result_for_dead_pages() {
        let (fetcher, extractor) = extractor(StubFetcher::new().status(PAGE, 404));
        assert_eq!(extractor.extract_image(PAGE).await, "");
        assert_eq!(extractor.images.get(PAGE).await, Some(String::new()));
        assert_eq!(extractor.extract_image(PAGE).await, "");
        // One GET from resolution, one for the page itself; none on the retry.
        assert_eq!(fetcher.get_count(PAGE), 2);
    }

    #[tokio::test]
    async fn test_extract_image_empty_url() {
        let (fetcher, extractor) = extractor(StubFetcher::new());
        assert_eq!(extractor.extract_image("").await, "");
        assert_eq!(fetcher.total_gets(), 0);
    }
}
