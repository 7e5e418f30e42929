//! In-memory [`Store`] implementation for tests and dry runs.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`; locks are never held across
//! an `.await`.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::SummaryRecord;

use super::{RecordFilter, Store};

#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, SummaryRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl Store for InMemoryStore {
    async fn exists(&self, eo_id: &str) -> Result<bool> {
        Ok(self.records.read().map_err(poisoned)?.contains_key(eo_id))
    }

    async fn get(&self, eo_id: &str) -> Result<Option<SummaryRecord>> {
        Ok(self.records.read().map_err(poisoned)?.get(eo_id).cloned())
    }

    async fn save(&self, record: &SummaryRecord) -> Result<()> {
        self.records
            .write()
            .map_err(poisoned)?
            .insert(record.eo_id.clone(), record.clone());
        Ok(())
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<SummaryRecord>> {
        let mut matching: Vec<SummaryRecord> = self
            .records
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.date_issued
                .cmp(&a.date_issued)
                .then_with(|| a.eo_id.cmp(&b.eo_id))
        });
        Ok(matching)
    }
}
