// src/types/events.rs
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use super::records::{JobId, Timestamp};

/// Notifications emitted by committed ledger transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum LedgerEvent {
    CompanyRegistered { company: Address, name: String },
    CompanyProfileUpdated { company: Address, name: String },
    IndividualRegistered { individual: Address },
    IndividualProfileUpdated { individual: Address, version: u64 },
    JobCreated { job_id: JobId, company: Address, title: String },
    ApplicationSubmitted { job_id: JobId, applicant: Address },
    ApplicantEvaluated { job_id: JobId, applicant: Address },
}

impl LedgerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::CompanyRegistered { .. } => "CompanyRegistered",
            LedgerEvent::CompanyProfileUpdated { .. } => "CompanyProfileUpdated",
            LedgerEvent::IndividualRegistered { .. } => "IndividualRegistered",
            LedgerEvent::IndividualProfileUpdated { .. } => "IndividualProfileUpdated",
            LedgerEvent::JobCreated { .. } => "JobCreated",
            LedgerEvent::ApplicationSubmitted { .. } => "ApplicationSubmitted",
            LedgerEvent::ApplicantEvaluated { .. } => "ApplicantEvaluated",
        }
    }

    /// Indexed job id, if the event carries one.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            LedgerEvent::JobCreated { job_id, .. }
            | LedgerEvent::ApplicationSubmitted { job_id, .. }
            | LedgerEvent::ApplicantEvaluated { job_id, .. } => Some(*job_id),
            _ => None,
        }
    }

    /// Indexed address: the registering party, the job's company or the applicant.
    pub fn subject(&self) -> Address {
        match self {
            LedgerEvent::CompanyRegistered { company, .. }
            | LedgerEvent::CompanyProfileUpdated { company, .. }
            | LedgerEvent::JobCreated { company, .. } => *company,
            LedgerEvent::IndividualRegistered { individual }
            | LedgerEvent::IndividualProfileUpdated { individual, .. } => *individual,
            LedgerEvent::ApplicationSubmitted { applicant, .. }
            | LedgerEvent::ApplicantEvaluated { applicant, .. } => *applicant,
        }
    }
}

/// An event with its position in the log and the time of the emitting transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub timestamp: Timestamp,
    pub event: LedgerEvent,
}
