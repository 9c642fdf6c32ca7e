// src/translate/providers/deepl.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::translate::types::{Lang, Translator};

pub const ENV_API_KEY: &str = "DEEPL_API_KEY";
pub const ENV_API_URL: &str = "DEEPL_API_URL";
pub const DEFAULT_API_URL: &str = "https://api-free.deepl.com/v2/translate";

#[derive(Debug, Deserialize)]
struct Resp {
    translations: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    text: String,
}

/// DeepL REST provider (Korean source).
pub struct DeeplTranslator {
    http: reqwest::Client,
    api_key: String,
    url: String,
}

impl DeeplTranslator {
    pub fn new(http: reqwest::Client, api_key: String, url: Option<String>) -> Self {
        Self {
            http,
            api_key,
            url: url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    /// Returns `None` when `DEEPL_API_KEY` is unset or blank.
    pub fn from_env(http: reqwest::Client) -> Option<Self> {
        let key = std::env::var(ENV_API_KEY).ok()?;
        if key.trim().is_empty() {
            return None;
        }
        let url = std::env::var(ENV_API_URL)
            .ok()
            .filter(|u| !u.trim().is_empty());
        Some(Self::new(http, key.trim().to_string(), url))
    }
}

/// Pull `translations[0].text` out of a DeepL response body.
pub fn parse_response(body: &str) -> Result<String> {
    let resp: Resp = serde_json::from_str(body).context("parsing deepl response")?;
    let text = resp
        .translations
        .into_iter()
        .next()
        .map(|t| t.text.trim().to_string())
        .ok_or_else(|| anyhow!("deepl response has no translations"))?;
    if text.is_empty() {
        bail!("deepl returned empty text");
    }
    Ok(text)
}

#[async_trait]
impl Translator for DeeplTranslator {
    async fn translate(&self, text: &str, target: Lang) -> Result<String> {
        if self.api_key.is_empty() {
            bail!("deepl api key missing");
        }
        let form = [
            ("text", text),
            ("target_lang", target.code()),
            ("source_lang", "KO"),
        ];
        let resp = self
            .http
            .post(&self.url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&form)
            .send()
            .await
            .context("deepl http post()")?
            .error_for_status()
            .context("deepl http status")?;
        let body = resp.text().await.context("deepl http .text()")?;
        parse_response(&body)
    }

    fn name(&self) -> &'static str {
        "deepl"
    }
}
