// src/snapshot.rs
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::assemble::RankingRecord;
use crate::translate::cache::write_json_atomic;

/// KRW per USD, carried as a constant for downstream price conversion.
pub const FX_RATE: u32 = 1350;
pub const LANGUAGES: [&str; 3] = ["ko", "en", "ja"];
pub const CREDENTIAL_ENV: [&str; 2] = ["DEEPL_API_KEY", "GEMINI_API_KEY"];
pub const UPDATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationMeta {
    pub languages: Vec<String>,
    pub cache_location: String,
    pub provider_order: Vec<String>,
    pub credential_env: Vec<String>,
}

impl TranslationMeta {
    pub fn new(cache_location: String, provider_order: Vec<String>) -> Self {
        Self {
            languages: LANGUAGES.iter().map(|s| s.to_string()).collect(),
            cache_location,
            provider_order,
            credential_env: CREDENTIAL_ENV.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The single document one run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    pub updated_at: String,
    pub fx_rate: u32,
    pub translation_meta: TranslationMeta,
    pub rankings: Vec<RankingRecord>,
}

impl SnapshotDocument {
    /// Stamp with the current local time (second precision).
    pub fn new(translation_meta: TranslationMeta, rankings: Vec<RankingRecord>) -> Self {
        Self {
            updated_at: chrono::Local::now().format(UPDATED_AT_FORMAT).to_string(),
            fx_rate: FX_RATE,
            translation_meta,
            rankings,
        }
    }
}

/// Write the snapshot as pretty UTF-8 JSON via temp file + rename.
pub fn write_snapshot(path: &Path, doc: &SnapshotDocument) -> Result<()> {
    write_json_atomic(path, doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_contract_field_names() {
        let doc = SnapshotDocument::new(
            TranslationMeta::new("translation_cache.json".into(), vec!["deepl".into()]),
            vec![],
        );
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["fxRate"], 1350);
        assert_eq!(v["translationMeta"]["languages"][2], "ja");
        assert_eq!(v["translationMeta"]["cacheLocation"], "translation_cache.json");
        assert_eq!(v["translationMeta"]["providerOrder"][0], "deepl");
        assert!(v["rankings"].as_array().unwrap().is_empty());
        assert!(chrono::NaiveDateTime::parse_from_str(
            v["updatedAt"].as_str().unwrap(),
            UPDATED_AT_FORMAT
        )
        .is_ok());
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out/data.json");
        let doc = SnapshotDocument::new(TranslationMeta::new("m".into(), vec![]), vec![]);
        write_snapshot(&p, &doc).unwrap();
        let back: SnapshotDocument =
            serde_json::from_str(&std::fs::read_to_string(&p).unwrap()).unwrap();
        assert_eq!(back, doc);
    }
}
