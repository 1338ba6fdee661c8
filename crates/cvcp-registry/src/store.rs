//! In-memory per-subject state.
//!
//! One [`SubjectRecord`] per subject that has ever been submitted for.
//! Records are never deleted. Writes replace a whole record at once, which
//! is what lets the registry stage changes and commit them atomically.

use std::collections::BTreeMap;

use cvcp_core::types::{Address, CreditScore, ProcessedData, UpdateMetadata};

use crate::history::ScoreHistory;

/// Everything the registry keeps for one subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct SubjectRecord {
    /// Latest accepted snapshot.
    pub snapshot: Option<ProcessedData>,
    /// Current score; inactive until the first computation.
    pub score: CreditScore,
    pub history: ScoreHistory,
    /// Audit record of the latest computation.
    pub metadata: Option<UpdateMetadata>,
}

impl SubjectRecord {
    /// Unix seconds of the latest accepted submission.
    pub fn last_submission(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.timestamp)
    }
}

/// Keyed by subject, iterated in address order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectStore {
    records: BTreeMap<Address, SubjectRecord>,
}

impl SubjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_records(records: BTreeMap<Address, SubjectRecord>) -> Self {
        Self { records }
    }

    pub fn get(&self, subject: &Address) -> Option<&SubjectRecord> {
        self.records.get(subject)
    }

    /// Copy of the record for `subject`, or an empty one.
    pub fn load(&self, subject: &Address) -> SubjectRecord {
        self.records.get(subject).cloned().unwrap_or_default()
    }

    /// Replace the record for `subject`.
    pub fn put(&mut self, subject: Address, record: SubjectRecord) {
        self.records.insert(subject, record);
    }

    /// Apply `f` to every record.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut SubjectRecord)) {
        self.records.values_mut().for_each(|r| f(r));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Subjects with an active score, in address order.
    pub fn scored(&self) -> Vec<Address> {
        self.records
            .iter()
            .filter(|(_, r)| r.score.is_active)
            .map(|(a, _)| *a)
            .collect()
    }

    pub(crate) fn records(&self) -> &BTreeMap<Address, SubjectRecord> {
        &self.records
    }
}
