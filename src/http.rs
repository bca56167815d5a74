//! HTTP primitives used by the resolver, extractor and scrapers.
//!
//! Everything above this module talks to the network through the [`Fetcher`]
//! trait, so the pipeline can be driven by canned pages in tests. The
//! production implementation, [`HttpFetcher`], wraps a single shared
//! [`reqwest::Client`] that follows redirects; each call carries its own
//! timeout, which is the only cancellation mechanism.

use crate::error::{Error, Result};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Which request headers to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// User-Agent and a generic HTML `Accept`.
    Basic,
    /// Everything a desktop browser sends for a page navigation.
    Browser,
}

/// A fetched page after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub final_url: Url,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Fetcher: Send + Sync {
    /// GET `url` following redirects.
    fn get(
        &self,
        url: &str,
        profile: HeaderProfile,
        timeout: Duration,
    ) -> impl Future<Output = Result<FetchedPage>> + Send;

    /// HEAD `url` following redirects, returning the final status.
    fn head(&self, url: &str, timeout: Duration) -> impl Future<Output = Result<u16>> + Send;
}

pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    fn headers(&self, profile: HeaderProfile) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        match profile {
            HeaderProfile::Basic => {
                headers.insert(
                    ACCEPT,
                    HeaderValue::from_static(
                        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                    ),
                );
            }
            HeaderProfile::Browser => {
                headers.insert(
                    ACCEPT,
                    HeaderValue::from_static(
                        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
                    ),
                );
                headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
                headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
            }
        }
        headers
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self), fields(timeout_secs = timeout.as_secs()))]
    async fn get(
        &self,
        url: &str,
        profile: HeaderProfile,
        timeout: Duration,
    ) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .headers(self.headers(profile))
            .timeout(timeout)
            .send()
            .await?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await?;
        debug!(status, final_url = %final_url, bytes = body.len(), "GET complete");
        Ok(FetchedPage {
            status,
            final_url,
            body,
        })
    }

    #[instrument(level = "debug", skip(self), fields(timeout_secs = timeout.as_secs()))]
    async fn head(&self, url: &str, timeout: Duration) -> Result<u16> {
        let response = self
            .client
            .head(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .timeout(timeout)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }
}

/// Parse `url`, mapping failures into the crate error.
pub fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(Error::from)
}
