use crate::core::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use std::sync::Arc;

lazy_static! {
    static ref SHARED_TRANSPORT: Arc<HttpTransport> = Arc::new(HttpTransport::new());
}

/// Fetches the raw bytes behind a resource key.
///
/// One attempt per call; retry policy is the caller's concern.
#[async_trait]
pub trait ResourceTransport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP transport over a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// The process-wide transport used when none is injected.
    pub fn shared() -> Arc<HttpTransport> {
        SHARED_TRANSPORT.clone()
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceTransport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
