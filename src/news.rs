//! Topic news assembly.
//!
//! A topic request scrapes the listing page mapped to that topic. When that
//! produces nothing (no topic, `general`, a dead page, or a query that
//! filters everything out) the English front page is used instead.

use crate::cache::MemoCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::ContentExtractor;
use crate::http::{Fetcher, HttpFetcher};
use crate::models::NormalizedArticle;
use crate::outputs::normalize::{DEFAULT_CATEGORY, Normalizer};
use crate::resolver::Resolver;
use crate::scrapers::topics::section_url_for_topic;
use crate::scrapers::{ListingScraper, RawListing};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The full pipeline wired from one [`Config`]: one fetcher and two caches
/// shared by every request.
pub struct NewsService<F> {
    scraper: ListingScraper<F>,
    normalizer: Normalizer<F>,
    extractor: Arc<ContentExtractor<F>>,
}

impl NewsService<HttpFetcher> {
    /// Build the service against the live network.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.user_agent)?);
        Self::new(fetcher, config)
    }
}

impl<F: Fetcher> NewsService<F> {
    /// Wire the pipeline over `fetcher`.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared by the resolver, the extractor and the scrapers
    /// * `config` - Validated before anything is built
    ///
    /// # Errors
    ///
    /// `Config` when validation fails, `InvalidUrl` when the site root does
    /// not parse.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let service = NewsService::new(Arc::new(HttpFetcher::new(UA)?), &Config::default())?;
    /// let articles = service.news(Some("chips"), Some("technology"), 5).await?;
    /// ```
    pub fn new(fetcher: Arc<F>, config: &Config) -> Result<Self> {
        config.validate()?;
        let resolver = Resolver::new(
            Arc::clone(&fetcher),
            MemoCache::from_settings("resolved_urls", &config.cache),
            &config.aggregator_host,
            config.timeouts.clone(),
        );
        let extractor = Arc::new(ContentExtractor::new(
            Arc::clone(&fetcher),
            resolver,
            MemoCache::from_settings("article_images", &config.cache),
            config.timeouts.clone(),
        ));
        Ok(Self {
            scraper: ListingScraper::new(fetcher, config)?,
            normalizer: Normalizer::new(Arc::clone(&extractor), &config.publisher_name),
            extractor,
        })
    }

    pub fn scraper(&self) -> &ListingScraper<F> {
        &self.scraper
    }

    pub fn extractor(&self) -> &ContentExtractor<F> {
        &self.extractor
    }

    pub fn resolver(&self) -> &Resolver<F> {
        self.extractor.resolver()
    }

    /// Articles about `topic`, optionally filtered by `query`.
    ///
    /// Errors when `max_results` is not positive, when the front-page
    /// fallback is unavailable, and when nothing survives filtering.
    #[instrument(level = "info", skip(self))]
    pub async fn news(
        &self,
        query: Option<&str>,
        topic: Option<&str>,
        max_results: i64,
    ) -> Result<Vec<NormalizedArticle>> {
        let max_results = usize::try_from(max_results)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                Error::InvalidInput("Invalid max_results. Must be a positive integer.".into())
            })?;
        let topic = topic
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());

        if let Some(topic) = topic.as_deref().filter(|t| *t != DEFAULT_CATEGORY) {
            let section_url = section_url_for_topic(self.scraper.site_root(), topic);
            info!(topic, %section_url, "Scraping topic section");
            let stubs = self.scraper.scrape_section(&section_url, max_results).await;
            let raw = RawListing::Stubs(stubs);
            let articles = self
                .normalizer
                .normalize(&raw, query, Some(topic), max_results)
                .await;
            if !articles.is_empty() {
                return Ok(articles);
            }
            warn!(topic, "Topic section gave no articles; falling back to the front page");
        }

        let report = self.scraper.scrape_homepage(false).await;
        if !report.is_ok() {
            return Err(Error::Upstream {
                status: report.status,
            });
        }
        let raw = RawListing::Sections(report.into_data().unwrap_or_default());
        let articles = self
            .normalizer
            .normalize(&raw, query, topic.as_deref(), max_results)
            .await;
        if articles.is_empty() {
            return Err(Error::NotFound("No articles found".into()));
        }
        Ok(articles)
    }
}
