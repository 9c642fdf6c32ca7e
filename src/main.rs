//! Best-seller harvester — binary entrypoint.
//! Runs one harvest and writes the snapshot document.

use anyhow::Context;
use bestseller_harvester::config::load_rules_default;
use bestseller_harvester::{build_runner, write_snapshot, HarvestSettings};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; JSON lines when HARVEST_LOG_JSON=1.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bestseller_harvester=info,harvest=info,translate=info,warn"));

    let json = std::env::var("HARVEST_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = HarvestSettings::from_env();
    let rules = load_rules_default().context("loading source rules")?;
    let output = settings.output_path.clone();

    let mut runner = build_runner(settings)?;
    let run = runner.run(&rules).await?;

    write_snapshot(&output, &run.snapshot)
        .with_context(|| format!("writing snapshot to {}", output.display()))?;

    tracing::info!(
        records = run.snapshot.rankings.len(),
        failed_rules = run.failures.len(),
        path = %output.display(),
        "snapshot saved"
    );
    Ok(())
}
