//! Web image search.
//!
//! The DuckDuckGo backend needs a per-query `vqd` token scraped from the
//! landing page before its `i.js` JSON endpoint will answer.

use std::collections::HashSet;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use super::http_client::HttpClient;
use super::AcquisitionError;

pub const DEFAULT_SEARCH_URL: &str = "https://duckduckgo.com";
pub const DEFAULT_REGION: &str = "wt-wt";
pub const DEFAULT_MAX_IMAGES: usize = 30;

/// Pages fetched per query before giving up on reaching `max_images`.
const MAX_PAGES: usize = 5;

/// One image result as reported by the search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHit {
    /// Direct URL of the full-size image.
    pub image: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Page the image was found on.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Safe-search level passed to the search service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    On,
    #[default]
    Moderate,
    Off,
}

impl SafeSearch {
    fn param(self) -> &'static str {
        match self {
            SafeSearch::On | SafeSearch::Moderate => "1",
            SafeSearch::Off => "-1",
        }
    }
}

/// A service that turns a search term into image URLs.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Return at most `max_images` hits for `term`.
    async fn search(&self, term: &str, max_images: usize) -> Result<Vec<ImageHit>>;
}

#[derive(Debug, Deserialize)]
struct ResultsPage {
    #[serde(default)]
    results: Vec<ImageHit>,
    #[serde(default)]
    next: Option<String>,
}

/// DuckDuckGo image search.
pub struct DuckDuckGoImages {
    client: HttpClient,
    base_url: Url,
    region: String,
    safe_search: SafeSearch,
}

impl DuckDuckGoImages {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: Url::parse(DEFAULT_SEARCH_URL).expect("default search URL is valid"),
            region: DEFAULT_REGION.to_string(),
            safe_search: SafeSearch::default(),
        }
    }

    /// Point the backend at a different host (mirrors, tests).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url =
            Url::parse(base_url).with_context(|| format!("Invalid search URL: {base_url}"))?;
        Ok(self)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_safe_search(mut self, safe_search: SafeSearch) -> Self {
        self.safe_search = safe_search;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Cannot build {path} URL from {}", self.base_url))
    }

    async fn fetch_vqd(&self, term: &str) -> Result<String> {
        let resp = self
            .client
            .get_text(self.base_url.as_str(), &[("q", term.to_string())], &[])
            .await?;
        if !resp.is_success() {
            return Err(AcquisitionError::Status {
                url: resp.url,
                status: resp.status,
            }
            .into());
        }
        extract_vqd(&resp.body).ok_or_else(|| AcquisitionError::TokenNotFound(term.to_string()).into())
    }
}

/// Pull the `vqd` token out of a search landing page.
pub fn extract_vqd(html: &str) -> Option<String> {
    static VQD: OnceLock<Regex> = OnceLock::new();
    let re = VQD.get_or_init(|| Regex::new(r#"vqd=["']?([0-9-]+)"#).expect("vqd regex is valid"));
    re.captures(html).map(|c| c[1].to_string())
}

/// Offset of the next results page, read from the `next` link.
fn next_offset(base: &Url, next: &str) -> Option<String> {
    let next = base.join(next).ok()?;
    next.query_pairs()
        .find(|(k, _)| k == "s")
        .map(|(_, v)| v.into_owned())
}

#[async_trait]
impl ImageSearch for DuckDuckGoImages {
    async fn search(&self, term: &str, max_images: usize) -> Result<Vec<ImageHit>> {
        if max_images == 0 {
            return Ok(Vec::new());
        }

        let vqd = self.fetch_vqd(term).await?;
        let endpoint = self.endpoint("i.js")?;
        let referer = self.base_url.to_string();

        let mut seen: HashSet<String> = HashSet::new();
        let mut hits: Vec<ImageHit> = Vec::new();
        let mut offset: Option<String> = None;

        for page in 0..MAX_PAGES {
            let mut query = vec![
                ("l", self.region.clone()),
                ("o", "json".to_string()),
                ("q", term.to_string()),
                ("vqd", vqd.clone()),
                ("f", ",,,,,".to_string()),
                ("p", self.safe_search.param().to_string()),
            ];
            if let Some(s) = &offset {
                query.push(("s", s.clone()));
            }

            let resp = self
                .client
                .get_text(endpoint.as_str(), &query, &[("Referer", referer.as_str())])
                .await?;
            if !resp.is_success() {
                return Err(AcquisitionError::Status {
                    url: resp.url,
                    status: resp.status,
                }
                .into());
            }

            let parsed: ResultsPage = serde_json::from_str(&resp.body)
                .map_err(|e| AcquisitionError::BadResponse(e.to_string()))?;
            tracing::debug!(
                "Search page {page} for '{term}' returned {} results",
                parsed.results.len()
            );

            for hit in parsed.results {
                if hit.image.is_empty() || !seen.insert(hit.image.clone()) {
                    continue;
                }
                hits.push(hit);
                if hits.len() >= max_images {
                    return Ok(hits);
                }
            }

            offset = match parsed.next.as_deref().and_then(|n| next_offset(&endpoint, n)) {
                Some(s) => Some(s),
                None => break,
            };
        }

        Ok(hits)
    }
}

/// Search `term` and return up to `max_images` image URLs.
pub async fn search_images(
    search: &dyn ImageSearch,
    term: &str,
    max_images: usize,
) -> Result<Vec<String>> {
    tracing::info!("searching for '{term}'");
    let hits = search
        .search(term, max_images)
        .await
        .with_context(|| format!("Image search for '{term}' failed"))?;
    Ok(hits
        .into_iter()
        .take(max_images)
        .map(|hit| hit.image)
        .collect())
}
