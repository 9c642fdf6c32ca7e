// src/translate/chain.rs
use std::time::Duration;

use anyhow::{Context, Result};
use metrics::counter;

use crate::translate::providers::{DeeplTranslator, GeminiTranslator};
use crate::translate::types::{Lang, Translator};

/// Ordered translation backends; the first non-empty answer wins.
pub struct ProviderChain {
    providers: Vec<Box<dyn Translator>>,
    timeout: Duration,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn Translator>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// No providers: every `translate` returns `None`.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Duration::from_secs(1))
    }

    /// DeepL first, then Gemini; providers without a credential are left out.
    pub fn from_env(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("bestseller-harvester/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building translation http client")?;

        let mut providers: Vec<Box<dyn Translator>> = Vec::new();
        match DeeplTranslator::from_env(http.clone()) {
            Some(p) => providers.push(Box::new(p)),
            None => tracing::info!(target: "translate", "deepl disabled: no credential"),
        }
        match GeminiTranslator::from_env(http) {
            Some(p) => providers.push(Box::new(p)),
            None => tracing::info!(target: "translate", "gemini disabled: no credential"),
        }
        Ok(Self::new(providers, timeout))
    }

    pub fn provider_order(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Best-effort: `None` means no translation is available, never an error.
    pub async fn translate(&self, text: &str, target: Lang) -> Option<String> {
        for p in &self.providers {
            counter!("translate_provider_calls_total").increment(1);
            let err = match tokio::time::timeout(self.timeout, p.translate(text, target)).await {
                Ok(Ok(out)) if !out.trim().is_empty() => return Some(out),
                Ok(Ok(_)) => anyhow::anyhow!("empty result"),
                Ok(Err(e)) => e,
                Err(_) => anyhow::anyhow!("timed out after {:?}", self.timeout),
            };
            counter!("translate_provider_failures_total").increment(1);
            tracing::debug!(
                target: "translate",
                provider = p.name(),
                lang = target.code(),
                error = ?err,
                "provider failed, trying next"
            );
        }
        None
    }
}
