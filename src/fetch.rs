// src/fetch.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Page transport: URL in, decoded markup out.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Non-2xx, connection errors and timeouts are all `Err`.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// Plain HTTP GET with a desktop-browser User-Agent.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} status"))?;
        resp.text()
            .await
            .with_context(|| format!("reading body of {url}"))
    }
}
