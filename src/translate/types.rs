// src/translate/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Target languages. Korean is always the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    En,
    Ja,
}

impl Lang {
    pub const TARGETS: [Lang; 2] = [Lang::En, Lang::Ja];

    /// Upper-case code, e.g. "EN".
    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "EN",
            Lang::Ja => "JA",
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            Lang::En => "English",
            Lang::Ja => "Japanese",
        }
    }
}

/// `{ko, en, ja}` triple attached to every translated record field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translations {
    pub ko: String,
    pub en: String,
    pub ja: String,
}

/// One translation backend.
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Translate Korean `text` into `target`. Any failure (missing key,
    /// transport, bad payload, empty output) is an `Err`.
    async fn translate(&self, text: &str, target: Lang) -> Result<String>;
    fn name(&self) -> &'static str;
}
