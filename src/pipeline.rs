//! Ingestion pipeline orchestration.
//!
//! A fixed pool of workers pulls [`ProcessingJob`]s from one shared queue and
//! drives each document through
//!
//! ```text
//! Queued → Deduping → Extracting → Chunking → Summarizing → AssessingImpact
//!        → Validating → { Persisting | Requeued | Abandoned }
//! ```
//!
//! Failures at any stage before validation are terminal for the run: the
//! document is logged, counted as done, and never persisted. A record that
//! fails validation goes back on the queue with its retry counter bumped
//! until `max_retries` is reached, then it is abandoned.
//!
//! [`Pipeline::run_batch`] returns once exactly one outcome has been
//! collected per input descriptor, however many passes each one took.
//! Re-queues are invisible to that count.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::beneficiary::infer_primary;
use crate::chunk::chunk_text;
use crate::config::Config;
use crate::extract::TextExtractor;
use crate::models::{DocumentDescriptor, ProcessingJob, SummaryRecord};
use crate::store::Store;
use crate::summarize::{split_bullets, Summarizer};
use crate::validate::missing_fields;

/// Per-job pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Queued,
    Deduping,
    Extracting,
    Chunking,
    Summarizing,
    AssessingImpact,
    Validating,
    Persisting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Queued => "queued",
            Stage::Deduping => "deduping",
            Stage::Extracting => "extracting",
            Stage::Chunking => "chunking",
            Stage::Summarizing => "summarizing",
            Stage::AssessingImpact => "assessing_impact",
            Stage::Validating => "validating",
            Stage::Persisting => "persisting",
        })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} failed: {source:#}")]
    Stage {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    #[error("cancelled")]
    Cancelled,
}

impl PipelineError {
    fn at(stage: Stage, source: impl Into<anyhow::Error>) -> Self {
        PipelineError::Stage {
            stage,
            source: source.into(),
        }
    }
}

/// Terminal result for one document lineage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Persisted,
    /// Already in the store; nothing was extracted or generated.
    Skipped,
    Failed(Stage),
    /// Failed validation on every pass.
    Abandoned { attempts: u32 },
    Cancelled,
}

/// Outcome counts for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub abandoned: usize,
    /// The run was cancelled before every document completed.
    pub cancelled: bool,
}

impl BatchReport {
    /// Documents that reached a terminal outcome.
    pub fn completed(&self) -> usize {
        self.persisted + self.skipped + self.failed + self.abandoned
    }

    fn record(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Persisted => self.persisted += 1,
            JobOutcome::Skipped => self.skipped += 1,
            JobOutcome::Failed(_) => self.failed += 1,
            JobOutcome::Abandoned { .. } => self.abandoned += 1,
            JobOutcome::Cancelled => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub workers: usize,
    pub max_retries: u32,
    pub max_chunk_chars: usize,
    /// Pause between successive chunk summary calls of one document.
    pub chunk_pause: Duration,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.pipeline.workers,
            max_retries: config.pipeline.max_retries,
            max_chunk_chars: config.chunking.max_chars,
            chunk_pause: Duration::from_millis(config.generation.chunk_pause_ms),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

enum Disposition {
    Done(JobOutcome),
    Requeue(ProcessingJob),
}

/// The worker-pool orchestrator. Cheap to clone; every worker holds a copy.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn Store>,
    extractor: Arc<dyn TextExtractor>,
    summarizer: Summarizer,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn Store>,
        extractor: Arc<dyn TextExtractor>,
        summarizer: Summarizer,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            extractor,
            summarizer,
            options,
        }
    }

    /// Process a batch of descriptors and block until each has one outcome.
    ///
    /// Triggering `cancel` stops workers at their next suspension point;
    /// nothing is persisted for documents still in flight.
    pub async fn run_batch(
        &self,
        descriptors: Vec<DocumentDescriptor>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let total = descriptors.len();
        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };
        if total == 0 {
            return report;
        }

        // Each document has at most one job queued at a time, so re-queues
        // never wait for capacity.
        let (job_tx, job_rx) = mpsc::channel::<ProcessingJob>(total);
        for descriptor in descriptors {
            if job_tx.send(ProcessingJob::new(descriptor)).await.is_err() {
                break;
            }
        }
        let queue = Arc::new(Mutex::new(job_rx));
        let (done_tx, mut done_rx) = mpsc::channel::<JobOutcome>(total);
        let stop = cancel.child_token();

        let workers = self.options.workers.max(1);
        info!(total, workers, "processing batch");

        let mut handles = JoinSet::new();
        for id in 1..=workers {
            handles.spawn(self.clone().worker(
                id,
                queue.clone(),
                job_tx.clone(),
                done_tx.clone(),
                stop.clone(),
            ));
        }
        drop(job_tx);
        drop(done_tx);

        while report.completed() < total {
            match done_rx.recv().await {
                Some(outcome) => report.record(&outcome),
                // Every worker has exited; only happens on cancellation.
                None => break,
            }
        }

        stop.cancel();
        while let Some(joined) = handles.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "worker task failed");
            }
        }

        report.cancelled = report.completed() < total;
        info!(
            total,
            persisted = report.persisted,
            skipped = report.skipped,
            failed = report.failed,
            abandoned = report.abandoned,
            cancelled = report.cancelled,
            "batch complete"
        );
        report
    }

    async fn worker(
        self,
        id: usize,
        queue: Arc<Mutex<mpsc::Receiver<ProcessingJob>>>,
        requeue: mpsc::Sender<ProcessingJob>,
        done: mpsc::Sender<JobOutcome>,
        stop: CancellationToken,
    ) {
        debug!(worker = id, "worker started");
        loop {
            let next = tokio::select! {
                biased;
                _ = stop.cancelled() => None,
                job = async { queue.lock().await.recv().await } => job,
            };
            let Some(job) = next else { break };

            match self.handle(id, job, &stop).await {
                Disposition::Requeue(job) => {
                    if requeue.send(job).await.is_err() {
                        break;
                    }
                }
                Disposition::Done(JobOutcome::Cancelled) => break,
                Disposition::Done(outcome) => {
                    if done.send(outcome).await.is_err() {
                        break;
                    }
                }
            }
        }
        debug!(worker = id, "worker stopped");
    }

    async fn handle(&self, worker: usize, job: ProcessingJob, cancel: &CancellationToken) -> Disposition {
        let span = info_span!(
            "job",
            worker,
            eo_id = %job.descriptor.eo_id,
            attempt = job.retries + 1
        );
        async move {
            info!(stage = %Stage::Queued, "processing");

            let built = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(PipelineError::Cancelled),
                built = self.build_record(&job.descriptor) => built,
            };

            let record = match built {
                Ok(Some(record)) => record,
                Ok(None) => {
                    info!(stage = %Stage::Deduping, "already stored, skipping");
                    return Disposition::Done(JobOutcome::Skipped);
                }
                Err(PipelineError::Cancelled) => {
                    warn!("cancelled before completion");
                    return Disposition::Done(JobOutcome::Cancelled);
                }
                Err(PipelineError::Stage { stage, source }) => {
                    warn!(stage = %stage, error = %format!("{:#}", source), "document failed");
                    return Disposition::Done(JobOutcome::Failed(stage));
                }
            };

            let missing = missing_fields(&record);
            if !missing.is_empty() {
                let missing = missing.join(", ");
                if job.retries < self.options.max_retries {
                    warn!(
                        stage = %Stage::Validating,
                        missing = %missing,
                        retry = job.retries + 1,
                        "incomplete record, re-queuing"
                    );
                    return Disposition::Requeue(job.requeued());
                }
                error!(
                    stage = %Stage::Validating,
                    missing = %missing,
                    "incomplete record, retries exhausted"
                );
                return Disposition::Done(JobOutcome::Abandoned {
                    attempts: job.retries + 1,
                });
            }

            if cancel.is_cancelled() {
                return Disposition::Done(JobOutcome::Cancelled);
            }

            match self.store.save(&record).await {
                Ok(()) => {
                    info!(stage = %Stage::Persisting, "saved");
                    Disposition::Done(JobOutcome::Persisted)
                }
                Err(e) => {
                    error!(stage = %Stage::Persisting, error = %format!("{:#}", e), "save failed");
                    Disposition::Done(JobOutcome::Failed(Stage::Persisting))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run the stages up to (not including) validation.
    ///
    /// Returns `Ok(None)` when the document is already stored.
    async fn build_record(
        &self,
        descriptor: &DocumentDescriptor,
    ) -> Result<Option<SummaryRecord>, PipelineError> {
        let exists = self
            .store
            .exists(&descriptor.eo_id)
            .await
            .map_err(|e| PipelineError::at(Stage::Deduping, e))?;
        if exists {
            return Ok(None);
        }

        let text = self
            .extractor
            .extract(&descriptor.pdf_url)
            .await
            .map_err(|e| PipelineError::at(Stage::Extracting, e))?;

        let chunks = chunk_text(&text, self.options.max_chunk_chars);
        debug!(stage = %Stage::Chunking, chunks = chunks.len(), "text chunked");

        let mut chunk_summaries = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 && !self.options.chunk_pause.is_zero() {
                tokio::time::sleep(self.options.chunk_pause).await;
            }
            debug!(stage = %Stage::Summarizing, chunk = i + 1, of = chunks.len(), "summarizing chunk");
            let summary = self
                .summarizer
                .summarize_chunk(chunk, i + 1)
                .await
                .map_err(|e| PipelineError::at(Stage::Summarizing, e))?;
            chunk_summaries.push(summary);
        }

        let final_summary = self
            .summarizer
            .merge_summaries(&chunk_summaries)
            .await
            .map_err(|e| PipelineError::at(Stage::Summarizing, e))?;

        let impact = self
            .summarizer
            .assess_impact(&final_summary)
            .await
            .map_err(|e| PipelineError::at(Stage::AssessingImpact, e))?;

        let primary = infer_primary(&final_summary, &impact);

        Ok(Some(SummaryRecord::from_parts(
            descriptor,
            split_bullets(&final_summary),
            impact,
            primary,
        )))
    }
}
