//! Content-type sniffing of candidate image URLs.

use anyhow::Result;

use super::http_client::HttpClient;

/// True when a Content-Type value names an image media type.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("image/")
}

/// HEAD `url` and report whether it serves an image. Request errors propagate.
pub async fn is_url_image(client: &HttpClient, url: &str) -> Result<bool> {
    let head = client.head(url).await?;
    Ok(head
        .content_type
        .as_deref()
        .is_some_and(is_image_content_type))
}

/// Keep only the URLs whose HEAD response reports an image content type.
///
/// A failed HEAD request counts as "not an image". Input order is preserved.
pub async fn filter_image_urls(
    client: &HttpClient,
    urls: &[String],
    concurrency: usize,
) -> Vec<String> {
    let heads = client.head_many(urls, concurrency).await;

    urls.iter()
        .zip(heads)
        .filter_map(|(url, head)| match head {
            Ok(h) if h.content_type.as_deref().is_some_and(is_image_content_type) => {
                Some(url.clone())
            }
            Ok(h) => {
                tracing::debug!(
                    "Dropping {url}: content type {}",
                    h.content_type.as_deref().unwrap_or("<none>")
                );
                None
            }
            Err(e) => {
                tracing::debug!("Dropping {url}: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_content_types() {
        assert!(is_image_content_type("image/png"));
        assert!(is_image_content_type("image/jpeg"));
        assert!(is_image_content_type("image/jpg"));
        assert!(is_image_content_type("image/jpg!d"));
        assert!(is_image_content_type("Image/WebP; charset=binary"));
        assert!(!is_image_content_type("text/html"));
        assert!(!is_image_content_type("application/octet-stream"));
        assert!(!is_image_content_type(""));
    }
}
