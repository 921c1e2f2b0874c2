//! Single-URL fetch and extract.

use std::time::Duration;

use crate::{DocumentError, html};

/// Wall-clock ceiling for one page fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches a page and extracts its main textual content.
///
/// # Errors
///
/// Returns [`DocumentError`] if the fetch fails, times out, or returns a
/// non-success status.
pub async fn fetch_and_extract(url: &str) -> Result<String, DocumentError> {
    let client = reqwest::Client::new();

    let response = client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;

    let body = response.text().await?;

    log::debug!("Fetched {} bytes from {url}", body.len());

    Ok(html::extract_main_text(&body))
}
