// src/ledger/error.rs
//! Named rejections. Every failed ledger call maps to exactly one variant and leaves
//! state untouched.

use alloy_primitives::Address;
use thiserror::Error;

use crate::fhe::ComputeError;
use crate::types::{JobId, Timestamp};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{0} is already registered")]
    AlreadyRegistered(Address),

    #[error("No individual profile for {0}")]
    IndividualNotFound(Address),

    #[error("No company profile for {0}")]
    CompanyNotFound(Address),

    #[error("Job {0} does not exist")]
    JobNotFound(JobId),

    #[error("Application deadline {deadline} is not after {now}")]
    DeadlineNotInFuture { deadline: Timestamp, now: Timestamp },

    #[error("Vacancy count must be at least 1")]
    NoVacancies,

    #[error("Applications for job {job_id} closed at {deadline}")]
    DeadlinePassed { job_id: JobId, deadline: Timestamp },

    #[error("{applicant} already applied to job {job_id}")]
    AlreadyApplied { job_id: JobId, applicant: Address },

    #[error("Job {0} is closed: evaluation has started")]
    EvaluationStarted(JobId),

    #[error("{caller} does not own job {job_id}")]
    NotJobOwner { job_id: JobId, caller: Address },

    #[error("Encrypted input rejected: {0}")]
    InvalidCiphertext(ComputeError),

    #[error("Confidential computation failed: {0}")]
    Compute(ComputeError),
}

impl LedgerError {
    /// Stable identifier for callers that must distinguish causes without parsing text.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            LedgerError::IndividualNotFound(_) => "INDIVIDUAL_NOT_FOUND",
            LedgerError::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            LedgerError::JobNotFound(_) => "JOB_NOT_FOUND",
            LedgerError::DeadlineNotInFuture { .. } => "DEADLINE_NOT_IN_FUTURE",
            LedgerError::NoVacancies => "NO_VACANCIES",
            LedgerError::DeadlinePassed { .. } => "DEADLINE_PASSED",
            LedgerError::AlreadyApplied { .. } => "ALREADY_APPLIED",
            LedgerError::EvaluationStarted(_) => "EVALUATION_STARTED",
            LedgerError::NotJobOwner { .. } => "NOT_JOB_OWNER",
            LedgerError::InvalidCiphertext(_) => "INVALID_CIPHERTEXT",
            LedgerError::Compute(_) => "COMPUTE_FAILED",
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
