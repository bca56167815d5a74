//! Runtime configuration.
//!
//! Settings come from an optional YAML file and are then overridden by
//! command-line flags or environment variables (see [`crate::cli`]). Every
//! field has a default, so an empty file or no file at all is valid.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

/// Browser-like User-Agent. Aggregators and the publisher serve different
/// markup to unknown clients.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
);

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Root that relative article links are resolved against.
    pub site_root: String,
    /// English front page scraped in homepage mode.
    pub homepage_url: String,
    /// Host of the aggregator whose redirect links need resolving.
    pub aggregator_host: String,
    /// Value used for `author` and `source` in normalized articles.
    pub publisher_name: String,
    pub user_agent: String,
    pub timeouts: Timeouts,
    pub cache: CacheSettings,
}

/// Per-call network timeouts, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    pub existence_check_secs: u64,
    pub redirect_follow_secs: u64,
    pub image_page_secs: u64,
    pub listing_page_secs: u64,
    pub article_body_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum entries per cache instance.
    pub capacity: u64,
    /// Optional time-to-live; `None` keeps entries until evicted by capacity.
    pub ttl_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_root: "https://www.bbc.com".to_string(),
            homepage_url: "https://www.bbc.com/".to_string(),
            aggregator_host: "news.google.com".to_string(),
            publisher_name: "BBC News".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeouts: Timeouts::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            existence_check_secs: 3,
            redirect_follow_secs: 5,
            image_page_secs: 8,
            listing_page_secs: 10,
            article_body_secs: 15,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            ttl_secs: None,
        }
    }
}

impl Timeouts {
    pub fn existence_check(&self) -> Duration {
        Duration::from_secs(self.existence_check_secs)
    }

    pub fn redirect_follow(&self) -> Duration {
        Duration::from_secs(self.redirect_follow_secs)
    }

    pub fn image_page(&self) -> Duration {
        Duration::from_secs(self.image_page_secs)
    }

    pub fn listing_page(&self) -> Duration {
        Duration::from_secs(self.listing_page_secs)
    }

    pub fn article_body(&self) -> Duration {
        Duration::from_secs(self.article_body_secs)
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Parse a YAML document. Missing keys fall back to their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a YAML config file from disk.
    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml_str(&raw)?;
        info!(path, site_root = %config.site_root, "Loaded configuration");
        Ok(config)
    }

    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.site_root)?;
        url::Url::parse(&self.homepage_url)?;
        if self.aggregator_host.trim().is_empty() {
            return Err(Error::Config("aggregator_host must not be empty".into()));
        }
        if self.cache.capacity == 0 {
            return Err(Error::Config("cache.capacity must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.site_root, "https://www.bbc.com");
        assert_eq!(config.aggregator_host, "news.google.com");
        assert_eq!(config.timeouts.existence_check(), Duration::from_secs(3));
        assert_eq!(config.timeouts.article_body(), Duration::from_secs(15));
        assert!(config.cache.ttl().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
publisher_name: "BBC World Service"
timeouts:
  image_page_secs: 4
cache:
  capacity: 50
  ttl_secs: 600
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.publisher_name, "BBC World Service");
        assert_eq!(config.timeouts.image_page_secs, 4);
        assert_eq!(config.timeouts.listing_page_secs, 10);
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.cache.ttl(), Some(Duration::from_secs(600)));
        assert_eq!(config.site_root, "https://www.bbc.com");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml_str("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = Config::from_yaml_str("timeouts: [1, 2").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = Config::default();
        config.cache.capacity = 0;
        assert!(config.validate().is_err());
    }
}
