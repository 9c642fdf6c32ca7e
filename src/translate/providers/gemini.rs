// src/translate/providers/gemini.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::translate::types::{Lang, Translator};

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
struct Req<'a> {
    contents: Vec<Content<'a>>,
}
#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
#[derive(Deserialize)]
struct Candidate {
    content: RespContent,
}
#[derive(Deserialize)]
struct RespContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}
#[derive(Deserialize)]
struct RespPart {
    #[serde(default)]
    text: String,
}

/// Google Gemini `generateContent` provider, prompted to translate.
pub struct GeminiTranslator {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiTranslator {
    pub fn new(http: reqwest::Client, api_key: String, model: Option<String>) -> Self {
        Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Returns `None` when `GEMINI_API_KEY` is unset or blank.
    pub fn from_env(http: reqwest::Client) -> Option<Self> {
        let key = std::env::var(ENV_API_KEY).ok()?;
        if key.trim().is_empty() {
            return None;
        }
        let model = std::env::var(ENV_MODEL)
            .ok()
            .filter(|m| !m.trim().is_empty());
        Some(Self::new(http, key.trim().to_string(), model))
    }
}

pub fn build_prompt(text: &str, target: Lang) -> String {
    format!(
        "Translate the following Korean product text into natural {}. \
         Return translated text only.\nText: {text}",
        target.english_name()
    )
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
pub fn parse_response(body: &str) -> Result<String> {
    let resp: Resp = serde_json::from_str(body).context("parsing gemini response")?;
    let text = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text.trim().to_string())
        .ok_or_else(|| anyhow!("gemini response has no candidates"))?;
    if text.is_empty() {
        bail!("gemini returned empty text");
    }
    Ok(text)
}

#[async_trait]
impl Translator for GeminiTranslator {
    async fn translate(&self, text: &str, target: Lang) -> Result<String> {
        if self.api_key.is_empty() {
            bail!("gemini api key missing");
        }
        let prompt = build_prompt(text, target);
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };
        let url = format!("{API_BASE}/models/{}:generateContent", self.model);
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .context("gemini http post()")?
            .error_for_status()
            .context("gemini http status")?;
        let body = resp.text().await.context("gemini http .text()")?;
        parse_response(&body)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
