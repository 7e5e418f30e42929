//! Durable store abstraction.
//!
//! The [`Store`] trait is the only view the pipeline and read API have of
//! persistence: a key/value store of [`SummaryRecord`]s keyed by `eo_id`.
//! Implementations are shared across workers behind an `Arc` and must be
//! safe for concurrent use without extra locking.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`exists`](Store::exists) | Deduplication gate point lookup |
//! | [`get`](Store::get) | Fetch one record |
//! | [`save`](Store::save) | Upsert a record by identifier |
//! | [`list`](Store::list) | Filtered listing for the read API |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::models::SummaryRecord;

pub use memory::InMemoryStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Whether a record with this identifier is already stored. Not-found is
    /// `Ok(false)`, never an error.
    async fn exists(&self, eo_id: &str) -> Result<bool>;

    async fn get(&self, eo_id: &str) -> Result<Option<SummaryRecord>>;

    /// Insert or replace the record keyed by `record.eo_id`.
    async fn save(&self, record: &SummaryRecord) -> Result<()>;

    /// Records matching `filter`, newest `date_issued` first.
    async fn list(&self, filter: &RecordFilter) -> Result<Vec<SummaryRecord>>;
}

/// Read-side query filters. Build with [`RecordFilter::normalized`] before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordFilter {
    /// Case-insensitive substring of the president's name.
    pub president: Option<String>,
    /// Prefix of `date_issued`, normally a four-digit year.
    pub year: Option<String>,
    /// Two-digit month segment.
    pub month: Option<String>,
    /// Two-digit day segment.
    pub day: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn two_digits(value: String) -> String {
    format!("{:0>2}", value.trim_start_matches('0'))
}

impl RecordFilter {
    /// Trim fields, drop empty ones, lowercase the president, and pad month
    /// and day to two digits (`"3"` and `"03"` both become `"03"`).
    pub fn normalized(self) -> Self {
        Self {
            president: non_empty(self.president).map(|p| p.to_lowercase()),
            year: non_empty(self.year),
            month: non_empty(self.month).map(two_digits),
            day: non_empty(self.day).map(two_digits),
        }
    }

    /// Whether `record` passes this (normalized) filter.
    pub fn matches(&self, record: &SummaryRecord) -> bool {
        if let Some(ref president) = self.president {
            if !record.president.to_lowercase().contains(president.as_str()) {
                return false;
            }
        }
        if let Some(ref year) = self.year {
            if !record.date_issued.starts_with(year.as_str()) {
                return false;
            }
        }
        if let Some(ref month) = self.month {
            if record.date_issued.get(5..7) != Some(month.as_str()) {
                return false;
            }
        }
        if let Some(ref day) = self.day {
            if record.date_issued.get(8..10) != Some(day.as_str()) {
                return false;
            }
        }
        true
    }
}
