//! # BBC News Scraper
//!
//! Resolves aggregator links to canonical BBC article URLs, extracts
//! representative images and body text, scrapes listing pages (topic
//! sections, the English front page and the language editions) and
//! normalizes the results into one article schema.
//!
//! ## Architecture
//!
//! 1. **Resolving**: [`resolver`] turns an article reference into a canonical URL
//! 2. **Extracting**: [`extractor`] finds the image and body of an article page
//! 3. **Scraping**: [`scrapers`] turns listing pages into article stubs
//! 4. **Normalizing**: [`outputs::normalize`] filters stubs and attaches images
//!
//! [`news::NewsService`] wires all four from a [`config::Config`]. Network
//! access goes through [`http::Fetcher`]; results are memoized in two
//! bounded [`cache::MemoCache`]s.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod http;
pub mod models;
pub mod news;
pub mod outputs;
pub mod resolver;
pub mod scrapers;
pub mod utils;

pub use error::{Error, Result};
