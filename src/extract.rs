//! PDF download and text extraction.
//!
//! Downloads a binary document fully into memory, extracts the text of every
//! page in page order, and rejects implausibly short results: a near-empty
//! extraction means a scan or parse failure, not a short order.
//!
//! Extraction is not retried here; the orchestrator owns retry policy.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::config::ExtractionConfig;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to download PDF: {0}")]
    Download(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("extracted text too short ({chars} chars, need {min})")]
    TooShort { chars: usize, min: usize },
}

/// Turns a document URL into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<String, ExtractError>;
}

/// Extract the text of an in-memory PDF, enforcing the minimum length.
pub fn extract_pdf_text(bytes: &[u8], min_chars: usize) -> Result<String, ExtractError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let chars = text.trim().chars().count();
    if chars < min_chars {
        return Err(ExtractError::TooShort {
            chars,
            min: min_chars,
        });
    }
    Ok(text)
}

/// Downloads PDFs over HTTP and extracts them on the blocking pool.
pub struct PdfExtractor {
    http: reqwest::Client,
    min_text_chars: usize,
}

impl PdfExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractError::Download(e.to_string()))?;
        Ok(Self {
            http,
            min_text_chars: config.min_text_chars,
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ExtractError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExtractError::Download(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExtractError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, url: &str) -> Result<String, ExtractError> {
        let bytes = self.download(url).await?;
        debug!(url, bytes = bytes.len(), "downloaded PDF");

        let min_chars = self.min_text_chars;
        // pdf-extract is CPU bound and can panic on malformed input.
        tokio::task::spawn_blocking(move || extract_pdf_text(&bytes, min_chars))
            .await
            .map_err(|e| ExtractError::Pdf(e.to_string()))?
    }
}
