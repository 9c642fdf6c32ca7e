// src/pipeline.rs
//! # Pipeline Runner
//! One harvest run: fetch each rule's page, assemble rankings, persist the
//! translation cache once, return the snapshot.
//!
//! Per-rule failures (bad rule, fetch error/timeout) are logged and collected,
//! never raised. Fetches run as spawned tasks (bounded by a semaphore) so they
//! keep making progress while this task assembles; assembly and every cache
//! write happen here, in configuration order.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::assemble::{assemble, RankingRecord};
use crate::config::{CompiledRule, HarvestSettings, SourceRule};
use crate::fetch::PageFetcher;
use crate::snapshot::{SnapshotDocument, TranslationMeta};
use crate::translate::TranslationCache;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("harvest_rules_total", "Rules attempted.");
        describe_counter!(
            "harvest_rule_failures_total",
            "Rules skipped due to invalid patterns or fetch errors."
        );
        describe_counter!("harvest_records_total", "Ranking records assembled.");
        describe_counter!(
            "translate_provider_calls_total",
            "Translation provider calls issued."
        );
        describe_counter!(
            "translate_provider_failures_total",
            "Translation provider calls that failed or timed out."
        );
        describe_counter!(
            "translate_cache_hits_total",
            "Languages served from the translation cache."
        );
        describe_counter!(
            "translate_fallbacks_total",
            "Languages that fell back to the untranslated text."
        );
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    /// Rule patterns failed validation.
    Rules,
    Fetch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
    pub source: String,
    pub category: String,
    pub stage: FailureStage,
    pub message: String,
}

impl RuleFailure {
    fn new(rule: &SourceRule, stage: FailureStage, err: &anyhow::Error) -> Self {
        Self {
            source: rule.source.clone(),
            category: rule.category.clone(),
            stage,
            message: format!("{err:#}"),
        }
    }
}

/// Result of one run: the snapshot plus what was skipped.
#[derive(Debug, Clone)]
pub struct HarvestRun {
    pub snapshot: SnapshotDocument,
    pub failures: Vec<RuleFailure>,
}

pub struct PipelineRunner {
    fetcher: Arc<dyn PageFetcher>,
    cache: TranslationCache,
    settings: HarvestSettings,
}

impl PipelineRunner {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        cache: TranslationCache,
        settings: HarvestSettings,
    ) -> Self {
        Self {
            fetcher,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Run every rule once. Errors only when no rules are configured.
    pub async fn run(&mut self, rules: &[SourceRule]) -> Result<HarvestRun> {
        ensure_metrics_described();
        if rules.is_empty() {
            bail!("no source rules configured");
        }

        let timeout = self.settings.fetch_timeout;
        let limiter = Arc::new(Semaphore::new(self.settings.fetch_concurrency.max(1)));
        let handles: Vec<_> = rules
            .iter()
            .cloned()
            .map(|rule| {
                let fetcher = self.fetcher.clone();
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    let _permit = limiter.acquire_owned().await;
                    prepare(fetcher.as_ref(), &rule, timeout).await
                })
            })
            .collect();

        let mut rankings: Vec<RankingRecord> = Vec::new();
        let mut failures: Vec<RuleFailure> = Vec::new();

        for (rule, handle) in rules.iter().zip(handles) {
            let prepared = match handle.await {
                Ok(p) => p,
                Err(e) => Err(RuleFailure::new(
                    rule,
                    FailureStage::Fetch,
                    &anyhow::Error::new(e).context("fetch task failed"),
                )),
            };
            counter!("harvest_rules_total").increment(1);
            let (compiled, page) = match prepared {
                Ok(v) => v,
                Err(failure) => {
                    counter!("harvest_rule_failures_total").increment(1);
                    tracing::warn!(
                        target: "harvest",
                        source = %failure.source,
                        category = %failure.category,
                        stage = ?failure.stage,
                        error = %failure.message,
                        "rule skipped"
                    );
                    failures.push(failure);
                    continue;
                }
            };

            let parsed = assemble(&compiled, &page, &mut self.cache, self.settings.max_rank).await;
            counter!("harvest_records_total").increment(parsed.len() as u64);
            tracing::info!(
                target: "harvest",
                source = %rule.source,
                category = %rule.category,
                records = parsed.len(),
                "parsed"
            );
            rankings.extend(parsed);
        }

        // Persist once; the snapshot does not depend on this succeeding.
        if let Err(e) = self.cache.save() {
            tracing::warn!(target: "translate", error = ?e, location = %self.cache.location(), "translation cache save failed");
        }

        let meta = TranslationMeta::new(self.cache.location(), self.cache.provider_order());
        Ok(HarvestRun {
            snapshot: SnapshotDocument::new(meta, rankings),
            failures,
        })
    }
}

/// Validate the rule and fetch its page.
async fn prepare(
    fetcher: &dyn PageFetcher,
    rule: &SourceRule,
    timeout: Duration,
) -> std::result::Result<(CompiledRule, String), RuleFailure> {
    let compiled = rule
        .compile()
        .map_err(|e| RuleFailure::new(rule, FailureStage::Rules, &e))?;

    tracing::info!(target: "harvest", source = %rule.source, category = %rule.category, url = %rule.endpoint, "fetching");
    let page = match tokio::time::timeout(timeout, fetcher.fetch(&rule.endpoint, timeout)).await {
        Ok(Ok(page)) => page,
        Ok(Err(e)) => return Err(RuleFailure::new(rule, FailureStage::Fetch, &e)),
        Err(_) => {
            let e = anyhow::anyhow!("fetch timed out after {timeout:?}");
            return Err(RuleFailure::new(rule, FailureStage::Fetch, &e));
        }
    };
    Ok((compiled, page))
}
