//! Command-line interface definitions for the BBC news scraper.
//!
//! Global options can come from flags or environment variables and are
//! layered over the YAML config file, which itself is optional.

use crate::config::Config;
use crate::scrapers::DEFAULT_MAX_RESULTS;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Resolve, scrape and normalize BBC News content.
///
/// # Examples
///
/// ```sh
/// # Front page, first section only
/// bbc_news_scraper homepage --latest
///
/// # Technology news mentioning "chips", written to a file
/// bbc_news_scraper --output ./tech.json news --topic technology --q chips
///
/// # Resolve an aggregator link
/// bbc_news_scraper resolve "https://news.google.com/rss/articles/CBMi..."
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "BBC_SCRAPER_CONFIG")]
    pub config: Option<String>,

    /// Write the JSON result here instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Root that relative article links resolve against
    #[arg(long, env = "BBC_SITE_ROOT")]
    pub site_root: Option<String>,

    /// Aggregator host whose links need resolving
    #[arg(long, env = "BBC_AGGREGATOR_HOST")]
    pub aggregator_host: Option<String>,

    /// User-Agent sent with every request
    #[arg(long, env = "BBC_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Maximum entries per cache
    #[arg(long, env = "BBC_CACHE_CAPACITY")]
    pub cache_capacity: Option<u64>,

    /// Cache entry time-to-live in seconds
    #[arg(long, env = "BBC_CACHE_TTL_SECS")]
    pub cache_ttl_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve an article reference to its canonical URL
    Resolve { url: String },

    /// Representative image of an article
    Image { url: String },

    /// Body text and image of an article
    Extract { url: String },

    /// Articles listed on a section page; front-page and edition URLs are
    /// recognized and scraped as such
    Section {
        url: String,
        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max: usize,
    },

    /// Sections of the English front page
    Homepage {
        /// Only the first section
        #[arg(long)]
        latest: bool,
    },

    /// Sections of a language edition front page
    Edition {
        code: String,
        #[arg(long)]
        latest: bool,
    },

    /// Normalized articles for a topic and query
    News {
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
        max_results: i64,
    },

    /// Supported language editions
    Languages,
}

impl Cli {
    /// Apply flag and environment overrides on top of `config`.
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(site_root) = &self.site_root {
            config.homepage_url = format!("{}/", site_root.trim_end_matches('/'));
            config.site_root = site_root.clone();
        }
        if let Some(host) = &self.aggregator_host {
            config.aggregator_host = host.clone();
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        if let Some(capacity) = self.cache_capacity {
            config.cache.capacity = capacity;
        }
        if let Some(ttl) = self.cache_ttl_secs {
            config.cache.ttl_secs = Some(ttl);
        }
        config
    }
}
