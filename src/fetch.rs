use crate::common::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Transport seam for the remote catalog. The host may substitute its
/// own fetch layer; tests script responses through it.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// Production transport backed by a shared reqwest client.
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl Default for ReqwestFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestFetch {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}
