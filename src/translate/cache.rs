// src/translate/cache.rs
//! Translation cache: trimmed Korean text → `{en, ja}`.
//!
//! Loaded once at run start, mutated in memory while records are assembled,
//! persisted once at run end. A key that is present is never re-translated,
//! so provider calls are bounded by the number of distinct strings seen.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::translate::chain::ProviderChain;
use crate::translate::types::{Lang, Translations};

/// Persisted value for one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTranslation {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub ja: String,
}

impl CachedTranslation {
    fn get(&self, lang: Lang) -> &str {
        match lang {
            Lang::En => &self.en,
            Lang::Ja => &self.ja,
        }
    }

    fn set(&mut self, lang: Lang, value: String) {
        match lang {
            Lang::En => self.en = value,
            Lang::Ja => self.ja = value,
        }
    }
}

pub type CacheMap = BTreeMap<String, CachedTranslation>;

/// Where the cache lives between runs.
pub trait CacheStore: Send + Sync {
    /// Missing or corrupt state is an empty map, never an error.
    fn load(&self) -> CacheMap;
    /// Replace persisted state; a failed save must leave the previous state intact.
    fn save(&self, map: &CacheMap) -> Result<()>;
    /// Human-readable location for snapshot metadata.
    fn location(&self) -> String;
}

/// UTF-8 JSON file; writes go to a sibling temp file then rename over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for JsonFileStore {
    fn load(&self) -> CacheMap {
        let s = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(target: "translate", path = %self.path.display(), error = ?e, "cache unreadable, starting empty");
                }
                return CacheMap::new();
            }
        };
        match serde_json::from_str(&s) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(target: "translate", path = %self.path.display(), error = ?e, "cache corrupt, starting empty");
                CacheMap::new()
            }
        }
    }

    fn save(&self, map: &CacheMap) -> Result<()> {
        write_json_atomic(&self.path, map)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Pretty JSON (non-ASCII kept verbatim), written to `<path>.tmp` then renamed.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("serializing json")?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    let mut f = fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    f.write_all(json.as_bytes())
        .with_context(|| format!("writing {}", tmp.display()))?;
    f.sync_all()
        .with_context(|| format!("syncing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming onto {}", path.display()))?;
    Ok(())
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub saved: Arc<Mutex<Option<CacheMap>>>,
}

impl MemoryStore {
    pub fn with(map: CacheMap) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Some(map))),
        }
    }

    pub fn saved_map(&self) -> Option<CacheMap> {
        self.saved.lock().ok().and_then(|g| g.clone())
    }
}

impl CacheStore for MemoryStore {
    fn load(&self) -> CacheMap {
        self.saved
            .lock()
            .ok()
            .and_then(|g| g.clone())
            .unwrap_or_default()
    }

    fn save(&self, map: &CacheMap) -> Result<()> {
        let mut g = self
            .saved
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        *g = Some(map.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Owned, injectable translation cache backed by a provider chain.
pub struct TranslationCache {
    entries: CacheMap,
    chain: ProviderChain,
    store: Box<dyn CacheStore>,
}

impl TranslationCache {
    /// Start from whatever the store last persisted.
    pub fn load(store: Box<dyn CacheStore>, chain: ProviderChain) -> Self {
        let entries = store.load();
        tracing::info!(target: "translate", entries = entries.len(), location = %store.location(), "translation cache loaded");
        Self {
            entries,
            chain,
            store,
        }
    }

    /// Resolve `{ko, en, ja}` for `text`, translating only what is missing.
    ///
    /// Empty input maps to all-empty and never touches the cache. A language
    /// no provider can serve falls back to the Korean text itself.
    pub async fn resolve(&mut self, text: &str) -> Translations {
        let key = text.trim();
        if key.is_empty() {
            return Translations::default();
        }

        let mut entry = self.entries.get(key).cloned().unwrap_or_default();
        for lang in Lang::TARGETS {
            if !entry.get(lang).is_empty() {
                counter!("translate_cache_hits_total").increment(1);
                continue;
            }
            let value = match self.chain.translate(key, lang).await {
                Some(t) => t,
                None => {
                    counter!("translate_fallbacks_total").increment(1);
                    key.to_string()
                }
            };
            entry.set(lang, value);
        }

        let out = Translations {
            ko: key.to_string(),
            en: entry.en.clone(),
            ja: entry.ja.clone(),
        };
        self.entries.insert(key.to_string(), entry);
        out
    }

    pub fn get(&self, text: &str) -> Option<&CachedTranslation> {
        self.entries.get(text.trim())
    }

    pub fn entries(&self) -> &CacheMap {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn location(&self) -> String {
        self.store.location()
    }

    pub fn provider_order(&self) -> Vec<String> {
        self.chain.provider_order()
    }

    /// Persist the whole map. Called once per run.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.entries)
    }
}
