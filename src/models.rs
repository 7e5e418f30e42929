//! Core data models used throughout the ingestion pipeline and read API.
//!
//! A [`DocumentDescriptor`] is produced by the fetcher, wrapped in a
//! [`ProcessingJob`] by the orchestrator, and turned into a
//! [`SummaryRecord`] once summarization succeeds.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata describing one executive order before any processing.
///
/// Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub eo_id: String,
    pub title: String,
    /// Derived from the issue date; `"Unknown"` when it cannot be derived.
    pub president: String,
    /// ISO calendar date (`YYYY-MM-DD`) as published by the listing API.
    pub date_issued: String,
    pub html_url: String,
    pub pdf_url: String,
}

/// A unit of work on the orchestrator queue.
///
/// The retry counter travels with the job, so no worker needs shared state
/// to know how many passes a document has had.
#[derive(Debug, Clone)]
pub struct ProcessingJob {
    pub descriptor: DocumentDescriptor,
    /// Number of times this job has been re-queued after failing validation.
    pub retries: u32,
}

impl ProcessingJob {
    pub fn new(descriptor: DocumentDescriptor) -> Self {
        Self {
            descriptor,
            retries: 0,
        }
    }

    /// Returns the job for its next pass, with the retry counter bumped.
    pub fn requeued(self) -> Self {
        Self {
            retries: self.retries + 1,
            ..self
        }
    }
}

/// One of the three fixed economic strata used to bucket impact.
///
/// The derived ordering (`Average < Poorest < Richest`) is also the
/// tie-break priority used by beneficiary inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeneficiaryGroup {
    Average,
    Poorest,
    Richest,
}

impl BeneficiaryGroup {
    pub const ALL: [BeneficiaryGroup; 3] = [
        BeneficiaryGroup::Average,
        BeneficiaryGroup::Poorest,
        BeneficiaryGroup::Richest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BeneficiaryGroup::Average => "average",
            BeneficiaryGroup::Poorest => "poorest",
            BeneficiaryGroup::Richest => "richest",
        }
    }

    /// Parses a group key, ignoring case and surrounding whitespace.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "average" => Some(BeneficiaryGroup::Average),
            "poorest" => Some(BeneficiaryGroup::Poorest),
            "richest" => Some(BeneficiaryGroup::Richest),
            _ => None,
        }
    }
}

impl fmt::Display for BeneficiaryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Impact sentence per beneficiary group.
///
/// Entries may be missing or empty when the generation service returned a
/// partial or malformed response; the validator catches that.
pub type ImpactMapping = BTreeMap<BeneficiaryGroup, String>;

/// The persisted unit, keyed by `eo_id`.
///
/// Field names match the stored/served JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub eo_id: String,
    pub title: String,
    pub date_issued: String,
    pub president: String,
    pub html_url: String,
    pub pdf_url: String,
    /// Bullet points, in the order the summary presented them.
    pub summary: Vec<String>,
    pub impact: ImpactMapping,
    pub primary_beneficiary: BeneficiaryGroup,
}

impl SummaryRecord {
    /// Builds a candidate record from a descriptor and the pipeline's outputs.
    pub fn from_parts(
        descriptor: &DocumentDescriptor,
        summary: Vec<String>,
        impact: ImpactMapping,
        primary_beneficiary: BeneficiaryGroup,
    ) -> Self {
        Self {
            eo_id: descriptor.eo_id.clone(),
            title: descriptor.title.clone(),
            date_issued: descriptor.date_issued.clone(),
            president: descriptor.president.clone(),
            html_url: descriptor.html_url.clone(),
            pdf_url: descriptor.pdf_url.clone(),
            summary,
            impact,
            primary_beneficiary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_to_stored_shape() {
        let mut impact = ImpactMapping::new();
        impact.insert(BeneficiaryGroup::Average, "a".into());
        impact.insert(BeneficiaryGroup::Poorest, "p".into());
        impact.insert(BeneficiaryGroup::Richest, "r".into());
        let record = SummaryRecord {
            eo_id: "2025-00001".into(),
            title: "T".into(),
            date_issued: "2025-02-01".into(),
            president: "Donald Trump".into(),
            html_url: "h".into(),
            pdf_url: "p".into(),
            summary: vec!["one".into()],
            impact,
            primary_beneficiary: BeneficiaryGroup::Richest,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["eo_id"], "2025-00001");
        assert_eq!(json["impact"]["poorest"], "p");
        assert_eq!(json["primary_beneficiary"], "richest");

        let back: SummaryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn requeue_bumps_retry_counter() {
        let job = ProcessingJob::new(DocumentDescriptor {
            eo_id: "x".into(),
            title: String::new(),
            president: String::new(),
            date_issued: String::new(),
            html_url: String::new(),
            pdf_url: String::new(),
        });
        assert_eq!(job.retries, 0);
        assert_eq!(job.requeued().requeued().retries, 2);
    }

    #[test]
    fn group_keys_parse_case_insensitively() {
        assert_eq!(
            BeneficiaryGroup::from_key(" Poorest "),
            Some(BeneficiaryGroup::Poorest)
        );
        assert_eq!(BeneficiaryGroup::from_key("middle"), None);
    }
}
