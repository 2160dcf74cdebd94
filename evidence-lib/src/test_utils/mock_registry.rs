//! In-memory provenance registry.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::vault::{ProvenanceRecord, ProvenanceRegistry};
use crate::Result;

/// Registry that keeps every record it receives.
#[derive(Default)]
pub struct RecordingRegistry {
    records: Mutex<Vec<ProvenanceRecord>>,
}

impl RecordingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received so far, oldest first.
    pub fn records(&self) -> Vec<ProvenanceRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProvenanceRegistry for RecordingRegistry {
    async fn record(&self, record: &ProvenanceRecord) -> Result<String> {
        let mut records = self.records.lock().unwrap();
        records.push(record.clone());
        Ok(format!("record-{}", records.len()))
    }
}
