// src/ledger/mod.rs
//! The matching engine: profile store, job registry, application ledger and the
//! evaluation/disclosure engine, all behind one explicit store object.
//!
//! Every entry point takes a [`Tx`] carrying the caller and block time. An operation
//! checks all of its preconditions and finishes every encrypted computation before it
//! touches state, so a rejected call leaves the ledger exactly as it was.

pub mod applications;
pub mod error;
pub mod evaluation;
pub mod identity;
pub mod index;
pub mod jobs;
pub mod views;


pub use error::{LedgerError, Result};
pub use evaluation::{EvaluationReport, SkipReason};
pub use index::{JobIndex, JobStats};
pub use views::{ApplicationSummary, CompanyJob, JobApplicant, JobFilter, JobListing, RoleSet};

use alloy_primitives::Address;
use std::collections::HashMap;
use std::sync::Arc;

use crate::fhe::{ConfidentialCompute, InputOrigin};
use crate::types::{
    Application, Company, EventRecord, Individual, Job, JobId, LedgerEvent, Tx,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Reject new applications once any applicant of the job has been evaluated.
    pub close_jobs_on_evaluation: bool,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            close_jobs_on_evaluation: true,
        }
    }
}

pub struct Ledger<C> {
    compute: Arc<C>,
    contract: Address,
    policy: LedgerPolicy,
    individuals: HashMap<Address, Individual>,
    companies: HashMap<Address, Company>,
    jobs: Vec<Job>,
    applications: HashMap<(JobId, Address), Application>,
    index: JobIndex,
    log: Vec<EventRecord>,
}

impl<C: ConfidentialCompute> Ledger<C> {
    pub fn new(compute: Arc<C>, contract: Address) -> Self {
        Self {
            compute,
            contract,
            policy: LedgerPolicy::default(),
            individuals: HashMap::new(),
            companies: HashMap::new(),
            jobs: Vec::new(),
            applications: HashMap::new(),
            index: JobIndex::default(),
            log: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: LedgerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn compute(&self) -> &Arc<C> {
        &self.compute
    }

    /// Address encrypted inputs must be attested for.
    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    fn origin(&self, tx: &Tx) -> InputOrigin {
        InputOrigin {
            contract: self.contract,
            sender: tx.sender,
        }
    }

    fn emit(&mut self, tx: &Tx, event: LedgerEvent) {
        self.index.apply(&event);
        self.log.push(EventRecord {
            seq: self.log.len() as u64,
            timestamp: tx.timestamp,
            event,
        });
    }

    /// Full event log in commit order.
    pub fn events(&self) -> &[EventRecord] {
        &self.log
    }

    /// Events with `seq >= from`.
    pub fn events_since(&self, from: u64) -> &[EventRecord] {
        let start = (from as usize).min(self.log.len());
        &self.log[start..]
    }

    pub fn index(&self) -> &JobIndex {
        &self.index
    }
}
