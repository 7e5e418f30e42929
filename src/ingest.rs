//! The `eod ingest` command.
//!
//! Fetches the descriptor list, wires the production extractor, generator
//! and SQLite store into a [`Pipeline`], runs one batch and prints the
//! report. A fetch failure aborts before any document is processed.

use std::sync::Arc;

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::db;
use crate::extract::PdfExtractor;
use crate::fetcher::Fetcher;
use crate::generation::OpenAiGenerator;
use crate::migrate;
use crate::pipeline::{BatchReport, Pipeline, PipelineOptions};
use crate::sqlite_store::SqliteStore;
use crate::summarize::Summarizer;

pub async fn run_ingest(
    config: &Config,
    dry_run: bool,
    limit: Option<usize>,
    workers: Option<usize>,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(workers) = workers {
        if workers == 0 {
            bail!("--workers must be at least 1");
        }
        config.pipeline.workers = workers;
    }

    let fetcher = Fetcher::new(&config.source)?;
    let mut descriptors = fetcher.fetch_all(cancel).await?;
    if let Some(limit) = limit {
        descriptors.truncate(limit);
    }

    if dry_run {
        println!("ingest (dry-run)");
        println!("  descriptors found: {}", descriptors.len());
        for d in &descriptors {
            println!("  {}  {}  {}  ({})", d.date_issued, d.eo_id, d.title, d.president);
        }
        return Ok(());
    }

    let pool = db::connect(&config).await?;
    migrate::apply_schema(&pool).await?;

    let generator = Arc::new(OpenAiGenerator::from_env(&config.generation)?);
    let extractor = Arc::new(PdfExtractor::new(&config.extraction)?);
    let pipeline = Pipeline::new(
        Arc::new(SqliteStore::new(pool.clone())),
        extractor,
        Summarizer::new(generator, &config.generation),
        PipelineOptions::from_config(&config),
    );

    let report = pipeline.run_batch(descriptors, cancel).await;
    pool.close().await;

    print_report(&report);
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!("ingest");
    println!("  descriptors: {}", report.total);
    println!("  persisted: {}", report.persisted);
    println!("  skipped (already stored): {}", report.skipped);
    println!("  failed: {}", report.failed);
    println!("  abandoned (incomplete): {}", report.abandoned);
    if report.cancelled {
        println!("cancelled ({} of {} completed)", report.completed(), report.total);
    } else {
        println!("ok");
    }
}
