//! Where blocklist text comes from.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum BlocklistError {
    #[error("blocklist fetch failed: {0}")]
    Fetch(String),
    #[error("blocklist source returned status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for BlocklistError {
    fn from(err: reqwest::Error) -> Self {
        Self::Fetch(err.to_string())
    }
}

/// A provider of newline-delimited blocklist text.
#[async_trait]
pub trait BlocklistSource: Send + Sync {
    /// Human-readable location for logs.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<String, BlocklistError>;
}

/// Fetches the list with a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpBlocklistSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpBlocklistSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, BlocklistError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl BlocklistSource for HttpBlocklistSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch(&self) -> Result<String, BlocklistError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BlocklistError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}
