//! Data models for scraped stubs, sections, reports and normalized articles.
//!
//! - [`ArticleStub`]: one article as discovered on a listing page
//! - [`Section`] / [`Sections`]: named, ordered groups of stubs
//! - [`ScrapeReport`]: a scrape outcome with timing and upstream status
//! - [`ArticleBody`]: extracted body HTML plus representative image
//! - [`NormalizedArticle`]: the uniform external schema
//!
//! External field names are camelCase to match the GNews-style schema
//! consumers already parse.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// An article as discovered on a listing page.
///
/// `link` is absolute. `image_hint` is whatever the listing page showed,
/// possibly empty; it is not the extracted representative image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleStub {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub image_hint: String,
}

impl ArticleStub {
    /// Build a stub, trimming every field. Returns `None` when the title is
    /// empty after trimming.
    pub fn new(title: &str, summary: &str, link: &str, image_hint: &str) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            summary: summary.trim().to_string(),
            link: link.trim().to_string(),
            image_hint: image_hint.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub articles: Vec<ArticleStub>,
}

/// Sections in the order they were found on the page.
///
/// Names are unique: inserting a section whose name already exists replaces
/// the earlier section's articles where it stood. Serializes as a JSON object
/// keyed by section name, preserving order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections(Vec<Section>);

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Empty sections are ignored.
    pub fn insert(&mut self, name: String, articles: Vec<ArticleStub>) {
        if articles.is_empty() {
            return;
        }
        match self.0.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.articles = articles,
            None => self.0.push(Section { name, articles }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[ArticleStub]> {
        self.0
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.articles.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn article_count(&self) -> usize {
        self.0.iter().map(|s| s.articles.len()).sum()
    }
}

impl Serialize for Sections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for section in &self.0 {
            map.serialize_entry(&section.name, &section.articles)?;
        }
        map.end()
    }
}

/// Outcome of one listing-page scrape.
///
/// Exactly one of `data` and `error` is set. `status` is the upstream status
/// on success, 503 when the upstream answered with anything but 200, and 500
/// when it could not be reached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeReport<T> {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_seconds: f64,
    pub timestamp: i64,
}

impl<T> ScrapeReport<T> {
    pub fn is_ok(&self) -> bool {
        self.status == 200 && self.data.is_some()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleBody {
    pub content: String,
    pub image: String,
}

/// The uniform external schema.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedArticle {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
    pub published_at: String,
    pub author: String,
    pub source: String,
    pub category: String,
    pub region: String,
    pub tags: Vec<String>,
    pub read_time_minutes: u32,
    /// Reserved for a downstream summarizer; always empty here.
    pub ai_summary: String,
}

/// One language edition of the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edition {
    pub code: String,
    pub name: String,
    pub url: String,
    pub description: String,
}
