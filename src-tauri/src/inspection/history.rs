use std::{
    collections::VecDeque,
    sync::{PoisonError, RwLock},
};

use chrono::Utc;

use crate::models::{EncodedImage, InspectionOutcome, InspectionRecord};

#[derive(Default)]
struct LogInner {
    /// Newest first.
    records: VecDeque<InspectionRecord>,
    next_sequence: u64,
}

/// Append-only history of completed inspections, kept in memory for the
/// session.
#[derive(Default)]
pub struct InspectionLog {
    inner: RwLock<LogInner>,
}

impl InspectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints the record's identity and stores it at the front. Identity and
    /// position are assigned under the same lock, so sequence order and list
    /// order always agree.
    pub fn append(&self, image: EncodedImage, outcome: InspectionOutcome) -> InspectionRecord {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.next_sequence += 1;
        let record = InspectionRecord::new(inner.next_sequence, image, outcome, Utc::now());
        inner.records.push_front(record.clone());
        record
    }

    pub fn current(&self) -> Option<InspectionRecord> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .front()
            .cloned()
    }

    pub fn history(&self) -> Vec<InspectionRecord> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
