//! Resolve aggregator redirect links to the real article URL.
//!
//! Google News hands out links of the form
//! `https://news.google.com/rss/articles/<payload>?oc=5`. Following the
//! redirect usually lands on the publisher; when it doesn't, the payload is a
//! base64url blob that often embeds the target URL in plain text.
//!
//! Resolution never fails: whatever happens, the caller gets a URL back (the
//! original one in the worst case), and that answer is cached under the
//! reference so repeated lookups don't repeat the network work.

use crate::cache::MemoCache;
use crate::config::Timeouts;
use crate::http::{Fetcher, HeaderProfile};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Decoded payloads are scanned for this many candidate URLs at most.
const MAX_PAYLOAD_CANDIDATES: usize = 3;

static EMBEDDED_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\x00-\x1f\x7f-\x9f\s"'<>]+"#).unwrap());

static URL_SAFE_LENIENT: Lazy<GeneralPurpose> = Lazy::new(|| {
    GeneralPurpose::new(
        &alphabet::URL_SAFE,
        GeneralPurposeConfig::new()
            .with_decode_allow_trailing_bits(true)
            .with_decode_padding_mode(DecodePaddingMode::Indifferent),
    )
});

/// Canonicalizes article references, memoizing every answer.
pub struct Resolver<F> {
    fetcher: Arc<F>,
    cache: MemoCache,
    aggregator_host: String,
    timeouts: Timeouts,
}

impl<F: Fetcher> Resolver<F> {
    /// Build a resolver.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Network access, shared with the rest of the pipeline
    /// * `cache` - Memo table keyed by the reference exactly as given
    /// * `aggregator_host` - Host whose links still need resolving after a
    ///   redirect lands on it (compared case-insensitively)
    /// * `timeouts` - Redirect-follow and HEAD-check budgets
    pub fn new(
        fetcher: Arc<F>,
        cache: MemoCache,
        aggregator_host: &str,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            fetcher,
            cache,
            aggregator_host: aggregator_host.to_ascii_lowercase(),
            timeouts,
        }
    }

    /// Best-effort canonical URL for `reference`.
    ///
    /// # Returns
    ///
    /// The publisher URL when a redirect or the embedded payload reveals it,
    /// otherwise `reference` itself. Never an error.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let url = resolver
    ///     .resolve("https://news.google.com/rss/articles/CBMiXyz?oc=5")
    ///     .await;
    /// assert!(url.starts_with("https://"));
    /// ```
    #[instrument(level = "info", skip(self))]
    pub async fn resolve(&self, reference: &str) -> String {
        self.cache
            .get_or_compute(reference, self.resolve_uncached(reference))
            .await
    }

    async fn resolve_uncached(&self, reference: &str) -> String {
        if let Some(url) = self.follow_redirects(reference).await {
            info!(resolved = %url, "Resolved via redirects");
            return url;
        }
        if let Some(url) = self.decode_payload(reference).await {
            info!(resolved = %url, "Resolved via payload decoding");
            return url;
        }
        info!("All resolution strategies failed; keeping original URL");
        reference.to_string()
    }

    async fn follow_redirects(&self, reference: &str) -> Option<String> {
        match self
            .fetcher
            .get(reference, HeaderProfile::Basic, self.timeouts.redirect_follow())
            .await
        {
            Ok(page) => {
                let host = page.final_url.host_str().unwrap_or("").to_ascii_lowercase();
                if host != self.aggregator_host {
                    Some(page.final_url.to_string())
                } else {
                    debug!(final_url = %page.final_url, "Redirect stayed on the aggregator");
                    None
                }
            }
            Err(e) => {
                warn!(error = %e, "Redirect follow failed");
                None
            }
        }
    }

    async fn decode_payload(&self, reference: &str) -> Option<String> {
        let candidates = payload_candidates(reference);
        if candidates.is_empty() {
            debug!("No embedded URLs in payload");
            return None;
        }
        for candidate in candidates {
            match self
                .fetcher
                .head(&candidate, self.timeouts.existence_check())
                .await
            {
                Ok(status) if (200..300).contains(&status) => return Some(candidate),
                Ok(status) => debug!(%candidate, status, "Candidate rejected"),
                Err(e) => debug!(%candidate, error = %e, "Candidate unreachable"),
            }
        }
        None
    }
}

/// The base64url segment that follows `/articles/`, without its query string.
fn encoded_segment(reference: &str) -> Option<&str> {
    let (_, rest) = reference.split_once("/articles/")?;
    let segment = rest.split(['?', '#']).next()?;
    let segment = segment.split('/').next()?;
    (!segment.is_empty()).then_some(segment)
}

/// Decode a base64url segment, completing missing `=` padding first.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let mut padded = segment.trim_end_matches('=').to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    match URL_SAFE_LENIENT.decode(padded.as_bytes()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            debug!(error = %e, "Payload is not base64url");
            None
        }
    }
}

/// Absolute URLs embedded in the decoded payload of `reference`, in order of
/// appearance, capped at [`MAX_PAYLOAD_CANDIDATES`].
fn payload_candidates(reference: &str) -> Vec<String> {
    let Some(bytes) = encoded_segment(reference).and_then(decode_segment) else {
        return Vec::new();
    };
    // Undecodable bytes are dropped rather than replaced so they can't end
    // up inside a candidate URL.
    let text = String::from_utf8_lossy(&bytes).replace('\u{FFFD}', "");
    EMBEDDED_URL
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .take(MAX_PAYLOAD_CANDIDATES)
        .collect()
}
