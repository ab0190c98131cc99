use crate::SourceError;
use async_trait::async_trait;
use std::time::Duration;

/// Fetches the raw body of a status endpoint.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch(&self, host: &str, port: &str, path: &str) -> Result<Vec<u8>, SourceError>;
}

/// Plain unauthenticated HTTP GET.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl StatusFetcher for HttpFetcher {
    async fn fetch(&self, host: &str, port: &str, path: &str) -> Result<Vec<u8>, SourceError> {
        let url = format!("http://{host}:{port}{path}");
        tracing::debug!(url = %url, "Fetching status page");
        let resp = self.client.get(&url).send().await?;
        let body = resp.bytes().await?;
        Ok(body.to_vec())
    }
}
