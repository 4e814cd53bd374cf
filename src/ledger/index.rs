// src/ledger/index.rs
//! Per-job counters derived from the event log.
//!
//! The ledger folds every committed event into a [`JobIndex`] inside the same
//! transaction, so reads never rescan history. [`JobIndex::replay`] rebuilds the same
//! state from a log and is used to check the two never drift.

use serde::Serialize;
use std::collections::HashMap;

use crate::types::{EventRecord, JobId, LedgerEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub applicants: u64,
    pub evaluated: u64,
}

impl JobStats {
    pub fn evaluation_started(&self) -> bool {
        self.evaluated > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobIndex {
    stats: HashMap<JobId, JobStats>,
}

impl JobIndex {
    pub fn apply(&mut self, event: &LedgerEvent) {
        match event {
            LedgerEvent::JobCreated { job_id, .. } => {
                self.stats.entry(*job_id).or_default();
            }
            LedgerEvent::ApplicationSubmitted { job_id, .. } => {
                self.stats.entry(*job_id).or_default().applicants += 1;
            }
            LedgerEvent::ApplicantEvaluated { job_id, .. } => {
                self.stats.entry(*job_id).or_default().evaluated += 1;
            }
            _ => {}
        }
    }

    pub fn replay<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        let mut index = Self::default();
        for record in events {
            index.apply(&record.event);
        }
        index
    }

    pub fn stats(&self, job_id: JobId) -> JobStats {
        self.stats.get(&job_id).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    fn record(seq: u64, event: LedgerEvent) -> EventRecord {
        EventRecord { seq, timestamp: 0, event }
    }

    #[test]
    fn test_replay_counts_applicants_and_evaluations() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        let log = vec![
            record(0, LedgerEvent::JobCreated { job_id: 0, company: a, title: "x".into() }),
            record(1, LedgerEvent::ApplicationSubmitted { job_id: 0, applicant: a }),
            record(2, LedgerEvent::ApplicationSubmitted { job_id: 0, applicant: b }),
            record(3, LedgerEvent::ApplicantEvaluated { job_id: 0, applicant: b }),
            record(4, LedgerEvent::IndividualRegistered { individual: a }),
        ];
        let index = JobIndex::replay(&log);
        let stats = index.stats(0);
        assert_eq!(stats.applicants, 2);
        assert_eq!(stats.evaluated, 1);
        assert!(stats.evaluation_started());
        assert_eq!(index.stats(7), JobStats::default());
    }
}
