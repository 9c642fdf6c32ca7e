// src/config/settings.rs
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_CACHE_PATH: &str = "HARVEST_CACHE_PATH";
pub const ENV_OUTPUT_PATH: &str = "HARVEST_OUTPUT_PATH";
pub const ENV_MAX_RANK: &str = "HARVEST_MAX_RANK";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "HARVEST_FETCH_TIMEOUT_SECS";
pub const ENV_TRANSLATE_TIMEOUT_SECS: &str = "HARVEST_TRANSLATE_TIMEOUT_SECS";
pub const ENV_FETCH_CONCURRENCY: &str = "HARVEST_FETCH_CONCURRENCY";

pub const DEFAULT_CACHE_PATH: &str = "translation_cache.json";
pub const DEFAULT_OUTPUT_PATH: &str = "data.json";
pub const DEFAULT_MAX_RANK: usize = 30;

/// Runtime knobs for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub cache_path: PathBuf,
    pub output_path: PathBuf,
    /// Max records per rule.
    pub max_rank: usize,
    pub fetch_timeout: Duration,
    /// Applied to each translation provider call separately.
    pub translate_timeout: Duration,
    pub fetch_concurrency: usize,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            max_rank: DEFAULT_MAX_RANK,
            fetch_timeout: Duration::from_secs(30),
            translate_timeout: Duration::from_secs(20),
            fetch_concurrency: 1,
        }
    }
}

impl HarvestSettings {
    /// Read settings from the environment; unset or unparsable values keep defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            cache_path: env_path(ENV_CACHE_PATH).unwrap_or(d.cache_path),
            output_path: env_path(ENV_OUTPUT_PATH).unwrap_or(d.output_path),
            max_rank: parse_positive(ENV_MAX_RANK, std::env::var(ENV_MAX_RANK).ok())
                .unwrap_or(d.max_rank),
            fetch_timeout: parse_positive(
                ENV_FETCH_TIMEOUT_SECS,
                std::env::var(ENV_FETCH_TIMEOUT_SECS).ok(),
            )
            .map(|s| Duration::from_secs(s as u64))
            .unwrap_or(d.fetch_timeout),
            translate_timeout: parse_positive(
                ENV_TRANSLATE_TIMEOUT_SECS,
                std::env::var(ENV_TRANSLATE_TIMEOUT_SECS).ok(),
            )
            .map(|s| Duration::from_secs(s as u64))
            .unwrap_or(d.translate_timeout),
            fetch_concurrency: parse_positive(
                ENV_FETCH_CONCURRENCY,
                std::env::var(ENV_FETCH_CONCURRENCY).ok(),
            )
            .unwrap_or(d.fetch_concurrency),
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

// parse optional positive integer env; zero and garbage are ignored
fn parse_positive(name: &str, raw: Option<String>) -> Option<usize> {
    let raw = raw?;
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            tracing::warn!(var = name, value = %raw, "ignoring invalid setting, using default");
            None
        }
    }
}
