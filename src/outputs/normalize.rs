//! Mapping scraped listings onto the uniform article schema.
//!
//! Stubs are taken in the order the page presented them. Query filtering and
//! the result cap are applied before any image lookup, so articles that are
//! dropped never cost a network round trip.

use crate::extractor::ContentExtractor;
use crate::http::Fetcher;
use crate::models::{ArticleStub, NormalizedArticle};
use crate::scrapers::RawListing;
use crate::utils::{char_len, contains_ignore_case};
use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub const DEFAULT_CATEGORY: &str = "general";
pub const REGION: &str = "global";
const CHARS_PER_MINUTE: usize = 200;

/// Estimated reading time: one minute per started block of 200 characters.
pub fn read_time_minutes(description: &str) -> u32 {
    (char_len(description) / CHARS_PER_MINUTE + 1) as u32
}

/// Category for a requested topic, lower-cased, or `general`.
pub fn category_for(topic: Option<&str>) -> String {
    topic
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Stubs that survive the title and query filters, paired with the
/// lower-cased name of the section they came from, capped at `max_results`.
///
/// A flat stub list has no section of its own and is tagged with `category`.
pub fn select<'a>(
    raw: &'a RawListing,
    query: Option<&str>,
    category: &'a str,
    max_results: usize,
) -> Vec<(&'a ArticleStub, String)> {
    let query = query.filter(|q| !q.is_empty());
    let groups: Vec<(&str, &[ArticleStub])> = match raw {
        RawListing::Stubs(stubs) => vec![(category, stubs.as_slice())],
        RawListing::Sections(sections) => sections
            .iter()
            .map(|s| (s.name.as_str(), s.articles.as_slice()))
            .collect(),
    };

    groups
        .into_iter()
        .flat_map(|(name, stubs)| stubs.iter().map(move |stub| (name, stub)))
        .filter(|(_, stub)| !stub.title.trim().is_empty())
        .filter(|(_, stub)| {
            query.is_none_or(|q| {
                contains_ignore_case(&format!("{} {}", stub.title, stub.summary), q)
            })
        })
        .take(max_results)
        .map(|(name, stub)| (stub, name.to_lowercase()))
        .collect()
}

/// Turns [`RawListing`]s into [`NormalizedArticle`]s, attaching images.
pub struct Normalizer<F> {
    extractor: Arc<ContentExtractor<F>>,
    publisher: String,
}

impl<F: Fetcher> Normalizer<F> {
    /// `publisher` fills both `author` and `source` of every article.
    pub fn new(extractor: Arc<ContentExtractor<F>>, publisher: &str) -> Self {
        Self {
            extractor,
            publisher: publisher.to_string(),
        }
    }

    /// Normalize `raw`, keeping page order. Images are looked up one article
    /// at a time.
    ///
    /// # Arguments
    ///
    /// * `raw` - Stubs or sections as scraped
    /// * `query` - Case-insensitive substring of `title + " " + description`;
    ///   used exactly as given
    /// * `topic` - Sets `category`, and the tag of a flat stub list
    /// * `max_results` - Cap applied after filtering
    #[instrument(level = "info", skip(self, raw), fields(candidates = raw.article_count()))]
    pub async fn normalize(
        &self,
        raw: &RawListing,
        query: Option<&str>,
        topic: Option<&str>,
        max_results: usize,
    ) -> Vec<NormalizedArticle> {
        let category = category_for(topic);
        let published_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let selected = select(raw, query, &category, max_results);
        debug!(selected = selected.len(), "Filtered stubs");

        let category = &category;
        let published_at = &published_at;
        let articles: Vec<NormalizedArticle> = stream::iter(selected)
            .then(|(stub, tag)| async move {
                let image_url = self.extractor.extract_image(&stub.link).await;
                NormalizedArticle {
                    title: stub.title.clone(),
                    description: stub.summary.clone(),
                    url: stub.link.clone(),
                    image_url,
                    published_at: published_at.clone(),
                    author: self.publisher.clone(),
                    source: self.publisher.clone(),
                    category: category.clone(),
                    region: REGION.to_string(),
                    tags: vec![tag],
                    read_time_minutes: read_time_minutes(&stub.summary),
                    ai_summary: String::new(),
                }
            })
            .collect()
            .await;

        info!(count = articles.len(), "Normalized articles");
        articles
    }
}
