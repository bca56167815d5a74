//! # BBC News Scraper
//!
//! Command-line front end for the resolution, extraction and scraping
//! pipeline. Every command prints one JSON document; logs go to stderr.
//!
//! ## Usage
//!
//! ```sh
//! bbc_news_scraper homepage --latest
//! bbc_news_scraper news --topic technology --max-results 5
//! bbc_news_scraper extract https://www.bbc.com/news/articles/c0000000000
//! ```

use bbc_news_scraper::cli::{Cli, Command};
use bbc_news_scraper::config::Config;
use bbc_news_scraper::news::NewsService;
use bbc_news_scraper::outputs::json::{to_pretty_json, write_json};
use bbc_news_scraper::scrapers::editions;
use bbc_news_scraper::utils::truncate_for_log;
use clap::Parser;
use serde::Serialize;
use serde_json::{Value, json};
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.command, ?args.config, "Parsed CLI arguments");

    let config = match &args.config {
        Some(path) => Config::load(path).await?,
        None => Config::default(),
    };
    let config = args.apply_overrides(config);

    let service = match NewsService::from_config(&config) {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let result = run(&service, &args.command).await;
    let result = match result {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, client_error = e.is_client_error(), "Command failed");
            return Err(e.into());
        }
    };

    debug!(preview = %truncate_for_log(&to_pretty_json(&result)?, 300), "Command result");
    write_json(&result, args.output.as_deref()).await?;

    let elapsed = start_time.elapsed();
    info!(
        elapsed_secs = elapsed.as_secs_f64(),
        "Finished in {}s",
        elapsed.as_secs()
    );
    Ok(())
}

fn to_value<T: Serialize>(value: &T) -> bbc_news_scraper::Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[instrument(level = "info", skip(service))]
async fn run(
    service: &NewsService<bbc_news_scraper::http::HttpFetcher>,
    command: &Command,
) -> bbc_news_scraper::Result<Value> {
    match command {
        Command::Resolve { url } => {
            let resolved = service.resolver().resolve(url).await;
            Ok(json!({ "original": url, "resolved": resolved }))
        }
        Command::Image { url } => {
            let image = service.extractor().extract_image(url).await;
            Ok(json!({ "url": url, "image": image }))
        }
        Command::Extract { url } => to_value(&service.extractor().extract_body(url).await),
        Command::Section { url, max } => {
            to_value(&service.scraper().scrape_listing(url, *max, false).await?)
        }
        Command::Homepage { latest } => to_value(&service.scraper().scrape_homepage(*latest).await),
        Command::Edition { code, latest } => {
            to_value(&service.scraper().scrape_edition(code, *latest).await?)
        }
        Command::News {
            q,
            topic,
            max_results,
        } => {
            let articles = service
                .news(q.as_deref(), topic.as_deref(), *max_results)
                .await?;
            Ok(json!({ "articles": articles }))
        }
        Command::Languages => {
            let languages = editions::languages();
            Ok(json!({ "count": languages.len(), "languages": languages }))
        }
    }
}
