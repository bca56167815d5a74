//! Listing-page scrapers.
//!
//! The publisher serves structurally different listing pages, so each page
//! family is a strategy with the same capability: turn a parsed document into
//! articles. [`PageFamily`] tags the variants and picks one from the URL;
//! [`ListingScraper`] does the fetching, timing and status reporting common
//! to all of them.
//!
//! | Family | Module | Markup |
//! |--------|--------|--------|
//! | Topic sections | [`section`] | article links recognized by href pattern |
//! | English front page | [`homepage`] | `data-testid` sections and cards |
//! | Language editions | [`editions`] | `section[aria-labelledby]` lists |
//!
//! Topic routing lives in [`topics`].

pub mod editions;
pub mod homepage;
pub mod section;
pub mod topics;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{Fetcher, HeaderProfile, parse_url};
use crate::models::{ArticleStub, ScrapeReport, Sections};
use chrono::Utc;
use editions::EditionPage;
use homepage::FrontPage;
use scraper::Html;
use section::SectionPage;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use url::Url;

/// Default cap on articles taken from one section page.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Extraction capability shared by every page family.
pub trait ListingStrategy {
    type Output;

    fn extract(&self, document: &Html, page_url: &Url) -> Self::Output;
}

/// What a listing page yields: a flat list from topic sections, or named
/// sections from front pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawListing {
    Stubs(Vec<ArticleStub>),
    Sections(Sections),
}

impl RawListing {
    pub fn article_count(&self) -> usize {
        match self {
            RawListing::Stubs(stubs) => stubs.len(),
            RawListing::Sections(sections) => sections.article_count(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PageFamily {
    Section(SectionPage),
    FrontPage(FrontPage),
    Edition(EditionPage),
}

impl PageFamily {
    /// Choose the strategy for `url`: the site root is the front page, known
    /// language paths are editions, anything else is a topic section.
    pub fn detect(url: &Url, site_root: &Url, max_results: usize, latest_only: bool) -> Self {
        let path = url.path().trim_matches('/');
        if path.is_empty() {
            PageFamily::FrontPage(FrontPage {
                site_root: site_root.clone(),
                latest_only,
            })
        } else if editions::is_edition_url(url) {
            PageFamily::Edition(EditionPage { latest_only })
        } else {
            PageFamily::Section(SectionPage::new(url.as_str(), site_root.clone(), max_results))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PageFamily::Section(_) => "section",
            PageFamily::FrontPage(_) => "front_page",
            PageFamily::Edition(_) => "edition",
        }
    }
}

impl ListingStrategy for PageFamily {
    type Output = RawListing;

    fn extract(&self, document: &Html, page_url: &Url) -> RawListing {
        match self {
            PageFamily::Section(s) => RawListing::Stubs(s.extract(document, page_url)),
            PageFamily::FrontPage(s) => RawListing::Sections(s.extract(document, page_url)),
            PageFamily::Edition(s) => RawListing::Sections(s.extract(document, page_url)),
        }
    }
}

/// Fetches listing pages and runs a [`ListingStrategy`] over them.
pub struct ListingScraper<F> {
    fetcher: Arc<F>,
    site_root: Url,
    homepage_url: String,
    timeout: Duration,
}

impl<F: Fetcher> ListingScraper<F> {
    /// # Errors
    ///
    /// `InvalidUrl` when `config.site_root` does not parse.
    pub fn new(fetcher: Arc<F>, config: &Config) -> Result<Self> {
        Ok(Self {
            fetcher,
            site_root: parse_url(&config.site_root)?,
            homepage_url: config.homepage_url.clone(),
            timeout: config.timeouts.listing_page(),
        })
    }

    pub fn site_root(&self) -> &Url {
        &self.site_root
    }

    /// Fetch `url` and run `strategy` over it.
    ///
    /// Anything but a 200 becomes a 503 report; an unreachable upstream
    /// becomes a 500 report. Neither is an `Err`.
    #[instrument(level = "info", skip(self, strategy))]
    pub async fn scrape<S: ListingStrategy>(
        &self,
        url: &str,
        strategy: &S,
    ) -> ScrapeReport<S::Output> {
        let start = Instant::now();
        let fetched = self
            .fetcher
            .get(url, HeaderProfile::Browser, self.timeout)
            .await;

        let (status, data, error) = match fetched {
            Ok(page) if page.status == 200 => {
                let document = Html::parse_document(&page.body);
                let output = strategy.extract(&document, &page.final_url);
                (200, Some(output), None)
            }
            Ok(page) => {
                warn!(status = page.status, "Listing page returned non-200 status");
                (
                    503,
                    None,
                    Some(format!(
                        "Failed to retrieve content. Upstream returned status code: {}",
                        page.status
                    )),
                )
            }
            Err(e) => {
                warn!(error = %e, "Listing page fetch failed");
                (500, None, Some(e.to_string()))
            }
        };

        let elapsed_seconds = (start.elapsed().as_secs_f64() * 1000.0).round() / 1000.0;
        info!(status, elapsed_seconds, "Scrape finished");
        ScrapeReport {
            status,
            data,
            error,
            elapsed_seconds,
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Articles from a topic section page, with timing and status.
    pub async fn scrape_section_report(
        &self,
        section_url: &str,
        max_results: usize,
    ) -> ScrapeReport<Vec<ArticleStub>> {
        let strategy = SectionPage::new(section_url, self.site_root.clone(), max_results);
        let report = self.scrape(section_url, &strategy).await;
        if let Some(stubs) = &report.data {
            info!(section_url, count = stubs.len(), "Scraped section");
        }
        report
    }

    /// Articles from a topic section page; empty when the page is unavailable.
    pub async fn scrape_section(&self, section_url: &str, max_results: usize) -> Vec<ArticleStub> {
        self.scrape_section_report(section_url, max_results)
            .await
            .into_data()
            .unwrap_or_default()
    }

    /// Sections of the English front page.
    pub async fn scrape_homepage(&self, latest_only: bool) -> ScrapeReport<Sections> {
        let strategy = FrontPage {
            site_root: self.site_root.clone(),
            latest_only,
        };
        self.scrape(&self.homepage_url, &strategy).await
    }

    /// Sections of a language edition front page. English is the main front
    /// page.
    ///
    /// # Arguments
    ///
    /// * `code` - Language code from [`editions::EDITIONS`], any case
    /// * `latest_only` - Stop after the first titled section
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an unknown language code. Upstream failures are
    /// reported inside the [`ScrapeReport`].
    pub async fn scrape_edition(
        &self,
        code: &str,
        latest_only: bool,
    ) -> Result<ScrapeReport<Sections>> {
        let Some(url) = editions::edition_url(code) else {
            return Err(Error::InvalidInput(format!("Unknown language: {code}")));
        };
        if code.trim().eq_ignore_ascii_case(editions::ENGLISH) {
            return Ok(self.scrape_homepage(latest_only).await);
        }
        Ok(self.scrape(url, &EditionPage { latest_only }).await)
    }

    /// Scrape any listing URL, choosing the page family from the URL.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let report = scraper
    ///     .scrape_listing("https://www.bbc.com/news/technology", 10, false)
    ///     .await?;
    /// if let Some(RawListing::Stubs(stubs)) = report.data {
    ///     println!("{} articles", stubs.len());
    /// }
    /// ```
    pub async fn scrape_listing(
        &self,
        url: &str,
        max_results: usize,
        latest_only: bool,
    ) -> Result<ScrapeReport<RawListing>> {
        let parsed = parse_url(url)?;
        let family = PageFamily::detect(&parsed, &self.site_root, max_results, latest_only);
        info!(url, family = family.name(), "Detected page family");
        Ok(self.scrape(url, &family).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::StubFetcher;

    const HOME: &str = "https://www.bbc.com/";

    fn scraper(fetcher: StubFetcher) -> ListingScraper<StubFetcher> {
        ListingScraper::new(Arc::new(fetcher), &Config::default()).unwrap()
    }

    fn world_front_page() -> &'static str {
        r#"<html><body>
          <div data-testid="vermont-section">
            <div data-testid="vermont-title-wrapper"><h2>World</h2></div>
            <div data-testid="edinburgh-card">
              <a href="/news/articles/c1">
                <img src="https://ichef.bbci.co.uk/news/480/a.jpg">
                <h2 data-testid="card-headline">Ceasefire talks resume in Cairo</h2>
                <p data-testid="card-description">Negotiators return to the table.</p>
              </a>
            </div>
            <div data-testid="edinburgh-card">
              <a href="/news/articles/c2"><p data-testid="card-description">Card without a headline</p></a>
            </div>
          </div>
        </body></html>"#
    }

    #[test]
    fn test_detect_family() {
        let root = Url::parse("https://www.bbc.com").unwrap();
        let detect = |u: &str| PageFamily::detect(&Url::parse(u).unwrap(), &root, 10, false).name();
        assert_eq!(detect("https://www.bbc.com/"), "front_page");
        assert_eq!(detect("https://www.bbc.com/mundo"), "edition");
        assert_eq!(detect("https://www.bbc.com/news/technology"), "section");
        assert_eq!(detect("https://www.bbc.com/sport"), "section");
    }

    #[tokio::test]
    async fn test_homepage_end_to_end() {
        let scraper = scraper(StubFetcher::new().page(HOME, world_front_page()));
        let report = scraper.scrape_homepage(false).await;
        assert_eq!(report.status, 200);
        assert!(report.error.is_none());
        let sections = report.data.unwrap();
        assert_eq!(sections.len(), 1);
        let world = sections.get("World").unwrap();
        assert_eq!(world.len(), 1);
        assert_eq!(world[0].title, "Ceasefire talks resume in Cairo");
        assert_eq!(world[0].link, "https://www.bbc.com/news/articles/c1");
        assert!(report.timestamp > 0);
        assert!(report.elapsed_seconds >= 0.0);
    }

    #[tokio::test]
    async fn test_non_200_becomes_503_record() {
        let scraper = scraper(StubFetcher::new().status(HOME, 404));
        let report = scraper.scrape_homepage(false).await;
        assert_eq!(report.status, 503);
        assert!(report.data.is_none());
        assert!(report.error.unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_network_failure_becomes_500_record() {
        let scraper = scraper(StubFetcher::new().failing(HOME));
        let report = scraper.scrape_homepage(true).await;
        assert_eq!(report.status, 500);
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn test_scrape_section_flattens_failures() {
        let url = "https://www.bbc.com/news/technology";
        let scraper = scraper(StubFetcher::new().status(url, 500));
        assert!(scraper.scrape_section(url, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_section_report() {
        let url = "https://www.bbc.com/news/technology";
        let html = r#"<div><a href="/news/articles/c0000000009">Battery breakthrough promises cheaper electric cars</a></div>"#;
        let scraper = scraper(StubFetcher::new().page(url, html));
        let report = scraper.scrape_section_report(url, 10).await;
        assert!(report.is_ok());
        assert_eq!(report.data.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_edition_is_client_error() {
        let scraper = scraper(StubFetcher::new());
        let err = scraper.scrape_edition("klingon", false).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_english_edition_uses_front_page() {
        let fetcher = StubFetcher::new().page(HOME, world_front_page());
        let scraper = scraper(fetcher);
        let report = scraper.scrape_edition("English", false).await.unwrap();
        assert!(report.data.unwrap().get("World").is_some());
    }

    #[tokio::test]
    async fn test_scrape_listing_detects_front_page() {
        let scraper = scraper(StubFetcher::new().page(HOME, world_front_page()));
        let report = scraper.scrape_listing(HOME, 10, false).await.unwrap();
        match report.data.unwrap() {
            RawListing::Sections(sections) => assert_eq!(sections.article_count(), 1),
            RawListing::Stubs(_) => panic!("front page should yield sections"),
        }
    }

    #[tokio::test]
    async fn test_scrape_listing_section_url_yields_stubs() {
        let url = "https://www.bbc.com/news/technology";
        let html = r#"<div><a href="/news/articles/c0000000009">Battery breakthrough promises cheaper electric cars</a></div>"#;
        let scraper = scraper(StubFetcher::new().page(url, html));
        let report = scraper.scrape_listing(url, 10, false).await.unwrap();
        assert!(report.is_ok());
        match report.data.unwrap() {
            RawListing::Stubs(stubs) => {
                assert_eq!(stubs.len(), 1);
                assert_eq!(stubs[0].link, "https://www.bbc.com/news/articles/c0000000009");
            }
            RawListing::Sections(_) => panic!("section page should yield stubs"),
        }
    }
}
