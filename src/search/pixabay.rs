// HTTP transport for the Pixabay image search API
use crate::model::LookupError;
use crate::search::SearchTransport;

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub struct PixabayTransport {
    client: Client,
    endpoint: String,
    api_key: String,
    per_page: String,
}

impl PixabayTransport {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        per_page: u32,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("grocery-imager/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            per_page: per_page.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl SearchTransport for PixabayTransport {
    async fn fetch(&self, query: &str) -> Result<String, LookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("image_type", "photo"),
                ("per_page", self.per_page.as_str()),
            ])
            .send()
            .await?;

        // Error statuses still carry a body; the payload check decides what it is worth.
        let status = response.status();
        if !status.is_success() {
            debug!("Search for '{}' answered {}", query, status);
        }

        Ok(response.text().await?)
    }
}
