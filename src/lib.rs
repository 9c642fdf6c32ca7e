// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod assemble;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod snapshot;
pub mod translate;

// ---- Re-exports for stable public API ----
pub use crate::assemble::{assemble, RankingRecord};
pub use crate::config::{HarvestSettings, SourceRule};
pub use crate::fetch::{HttpFetcher, PageFetcher};
pub use crate::pipeline::{FailureStage, HarvestRun, PipelineRunner, RuleFailure};
pub use crate::snapshot::{write_snapshot, SnapshotDocument, TranslationMeta};
pub use crate::translate::{JsonFileStore, ProviderChain, TranslationCache};

use std::sync::Arc;

/// Wire a production runner from settings: HTTP fetcher, env-configured
/// providers, JSON cache at `settings.cache_path`.
pub fn build_runner(settings: HarvestSettings) -> anyhow::Result<PipelineRunner> {
    let chain = ProviderChain::from_env(settings.translate_timeout)?;
    let cache = TranslationCache::load(
        Box::new(JsonFileStore::new(settings.cache_path.clone())),
        chain,
    );
    let fetcher = HttpFetcher::new()?;
    Ok(PipelineRunner::new(Arc::new(fetcher), cache, settings))
}
