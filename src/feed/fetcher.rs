use crate::feed::parser::{parse_feed, Article};
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Errors that can occur while downloading the feed document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the 5MB size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Feed body was not valid UTF-8
    #[error("Invalid UTF-8 in feed document")]
    InvalidUtf8,
}

/// Downloads the raw feed document with a single GET.
///
/// No retry: a failed attempt is reported to the caller, which decides
/// whether the run can continue.
///
/// # Errors
///
/// - [`FetchError::Timeout`] - no complete response within `timeout`
/// - [`FetchError::Network`] - connection, TLS, or body read errors
/// - [`FetchError::HttpStatus`] - non-2xx response
/// - [`FetchError::ResponseTooLarge`] - body over 5MB
/// - [`FetchError::InvalidUtf8`] - body is not UTF-8
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let response = tokio::time::timeout(timeout, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout(timeout))?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = tokio::time::timeout(timeout, read_limited_bytes(response, MAX_FEED_SIZE))
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;

    String::from_utf8(bytes).map_err(|_| FetchError::InvalidUtf8)
}

/// Fetches the feed and extracts up to five articles.
///
/// Any [`FetchError`] is logged and degrades to an empty list; the caller
/// treats an empty list as "nothing to post".
pub async fn fetch_articles(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Vec<Article> {
    match fetch_feed(client, url, timeout).await {
        Ok(document) => {
            let articles = parse_feed(&document);
            if articles.is_empty() {
                tracing::warn!(
                    feed = %url,
                    bytes = document.len(),
                    "Feed document contained no usable entries"
                );
            }
            articles
        }
        Err(e) => {
            tracing::warn!(feed = %url, error = %e, "Failed to fetch feed");
            Vec::new()
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
