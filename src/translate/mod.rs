// src/translate/mod.rs
//! Korean → English/Japanese enrichment: provider chain + persistent cache.

pub mod cache;
pub mod chain;
pub mod providers;
pub mod types;

pub use cache::{CacheMap, CacheStore, CachedTranslation, JsonFileStore, MemoryStore, TranslationCache};
pub use chain::ProviderChain;
pub use types::{Lang, Translations, Translator};
