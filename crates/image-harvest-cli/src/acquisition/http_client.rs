//! Async HTTP client wrapping reqwest.
//!
//! Handles redirects and timeouts. JSON/text GETs retry on 5xx and back off
//! on 429; image downloads and HEAD probes are single attempts.

use std::time::Duration;

use anyhow::{Context, Result};

use super::AcquisitionError;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

const MAX_RETRIES: u32 = 2;

/// Response from an HTTP GET request with a text body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Response from an HTTP HEAD request.
#[derive(Debug, Clone)]
pub struct HeadResponse {
    pub url: String,
    pub status: u16,
    /// Content-Type header.
    pub content_type: Option<String>,
    /// Content-Length header.
    pub content_length: Option<u64>,
}

/// HTTP client shared by search, content-type probing, and downloads.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with a browser user-agent.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self { client, timeout }
    }

    /// Default per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET a text resource with retry on 5xx and backoff on 429.
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        let mut retries = 0u32;

        loop {
            let mut builder = self.client.get(url).query(query);
            for (name, value) in headers {
                builder = builder.header(*name, *value);
            }

            match builder.send().await {
                Ok(r) => {
                    let status = r.status().as_u16();

                    if status >= 500 && retries < MAX_RETRIES {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tracing::debug!("{url} returned {status}, retrying in {delay:?}");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status == 429 && retries < MAX_RETRIES {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(2);
                        let delay = Duration::from_secs(retry_after.min(10));
                        tracing::debug!("{url} rate limited, waiting {delay:?}");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    let final_url = r.url().to_string();
                    let body = r.text().await.unwrap_or_default();

                    return Ok(HttpResponse {
                        url: url.to_string(),
                        final_url,
                        status,
                        body,
                    });
                }
                Err(e) => {
                    if retries < MAX_RETRIES {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(e).with_context(|| format!("GET {url} failed"));
                }
            }
        }
    }

    /// GET a binary resource with an explicit timeout. Non-2xx is an error.
    pub async fn get_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        let r = self.client.get(url).timeout(timeout).send().await?;
        let status = r.status().as_u16();
        if !r.status().is_success() {
            return Err(AcquisitionError::Status {
                url: url.to_string(),
                status,
            }
            .into());
        }
        Ok(r.bytes().await?.to_vec())
    }

    /// Perform a single HEAD request.
    pub async fn head(&self, url: &str) -> Result<HeadResponse> {
        let resp = self.client.head(url).send().await?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_length = resp
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        Ok(HeadResponse {
            url: url.to_string(),
            status,
            content_type,
            content_length,
        })
    }

    /// Perform HEAD requests with bounded concurrency, results in input order.
    pub async fn head_many(
        &self,
        urls: &[String],
        concurrency: usize,
    ) -> Vec<Result<HeadResponse>> {
        use futures::stream::{self, StreamExt};

        stream::iter(urls.iter())
            .map(|url| {
                let client = self.clone();
                let u = url.clone();
                async move { client.head(&u).await }
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}
