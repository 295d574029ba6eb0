use crate::model::LookupError;

/// One raw request to the image index. Returns the response body as text.
#[async_trait::async_trait]
pub trait SearchTransport: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<String, LookupError>;
}

/// Query in, best image URL out. `None` is a miss, never an error.
#[async_trait::async_trait]
pub trait ImageSearch: Send + Sync {
    async fn lookup(&self, query: &str) -> Option<String>;
}
