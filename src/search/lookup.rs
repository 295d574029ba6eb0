use crate::model::LookupError;
use crate::search::{ImageSearch, SearchTransport};

use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "largeImageURL")]
    large_image_url: String,
}

/// Picks the first hit's large image. An absent or empty hit list is a miss.
fn first_image(body: &str) -> Result<Option<String>, LookupError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Payload(e.to_string()))?;

    Ok(response
        .hits
        .into_iter()
        .next()
        .map(|hit| hit.large_image_url)
        .filter(|url| !url.is_empty()))
}

/// Retrying lookup over a [`SearchTransport`].
///
/// Transport failures and timeouts are retried after `backoff`, up to
/// `max_attempts` requests in total. An unusable payload ends the call at
/// once. Either way the caller only ever sees `Some(url)` or `None`.
pub struct ImageLookup<T> {
    transport: T,
    max_attempts: u32,
    backoff: Duration,
}

impl<T: SearchTransport> ImageLookup<T> {
    pub fn new(transport: T, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            transport,
            max_attempts,
            backoff,
        }
    }
}

#[async_trait::async_trait]
impl<T: SearchTransport> ImageSearch for ImageLookup<T> {
    async fn lookup(&self, query: &str) -> Option<String> {
        for attempt in 1..=self.max_attempts {
            let error = match self.transport.fetch(query).await {
                Ok(body) => match first_image(&body) {
                    Ok(url) => return url,
                    Err(e) => e,
                },
                Err(e) => e,
            };

            if !error.is_retryable() {
                warn!("Unusable response for '{}': {}", query, error);
                return None;
            }

            warn!(
                "Error searching '{}' (attempt {}/{}): {}",
                query, attempt, self.max_attempts, error
            );
            if attempt < self.max_attempts {
                sleep(self.backoff).await;
            }
        }

        None
    }
}
