//! `image-harvest check-url <url>...` — report whether URLs serve images.

use anyhow::Result;
use serde_json::json;

use crate::acquisition::filter::is_url_image;
use crate::cli::{build_context, output};
use crate::config::HarvestConfig;

/// Run the check-url command. Unreachable URLs are reported, not fatal.
pub async fn run(cfg: &HarvestConfig, urls: &[String]) -> Result<()> {
    let ctx = build_context(cfg)?;
    let mut rows = Vec::with_capacity(urls.len());

    for url in urls {
        let row = match is_url_image(&ctx.client, url).await {
            Ok(is_image) => json!({ "url": url, "image": is_image }),
            Err(e) => json!({ "url": url, "image": false, "error": e.to_string() }),
        };
        rows.push(row);
    }

    if output::is_json() {
        return output::print_json(&rows);
    }
    for row in &rows {
        let url = row["url"].as_str().unwrap_or_default();
        match row.get("error").and_then(|e| e.as_str()) {
            Some(err) => println!("[??] {url}: {err}"),
            None if row["image"].as_bool() == Some(true) => println!("[OK] {url}"),
            None => println!("[!!] {url}: not an image"),
        }
    }
    Ok(())
}
