// src/types/records.rs
//! Ledger records and the inputs that create them.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use super::enums::{PrimaryField, WorkPreference};
use crate::fhe::{Attestation, Ebool, Euint256, Euint32, Handle};

pub type JobId = u64;

/// Unix seconds.
pub type Timestamp = u64;

/// Caller identity and block time for a single ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tx {
    pub sender: Address,
    pub timestamp: Timestamp,
}

impl Tx {
    pub fn new(sender: Address, timestamp: Timestamp) -> Self {
        Self { sender, timestamp }
    }

    /// Transaction stamped with the current wall clock.
    pub fn now(sender: Address) -> Self {
        Self {
            sender,
            timestamp: unix_now(),
        }
    }
}

pub fn unix_now() -> Timestamp {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    pub expected_salary: Euint32,
    pub experience: Euint32,
    pub education: Euint32,
    pub sex: Euint32,
    pub contact_email: Euint256,
    pub contact_phone: Euint32,
    pub version: u64,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub industry: String,
    pub website: String,
    pub contact_email: String,
    pub location: String,
    pub owner: Address,
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub company: Address,
    pub title: String,
    pub location: String,
    pub work_preference: WorkPreference,
    pub primary_field: PrimaryField,
    pub max_salary: Euint32,
    pub min_experience: Euint32,
    pub min_education: Euint32,
    pub preferred_sex: Euint32,
    pub application_deadline: Timestamp,
    pub vacancy_count: u32,
    pub exists: bool,
}

impl Job {
    pub fn is_open_at(&self, now: Timestamp) -> bool {
        now < self.application_deadline
    }
}

/// Snapshot of an applicant's encrypted profile, frozen at apply time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub salary: Euint32,
    pub experience: Euint32,
    pub education: Euint32,
    pub sex: Euint32,
    pub contact_email: Euint256,
    pub contact_phone: Euint32,
    pub profile_version: u64,
    pub eligible: Option<Ebool>,
    pub evaluated: bool,
    pub applied: bool,
}

impl Application {
    pub(crate) fn snapshot(profile: &Individual) -> Self {
        Self {
            salary: profile.expected_salary,
            experience: profile.experience,
            education: profile.education,
            sex: profile.sex,
            contact_email: profile.contact_email,
            contact_phone: profile.contact_phone,
            profile_version: profile.version,
            eligible: None,
            evaluated: false,
            applied: true,
        }
    }

    pub fn state(&self) -> ApplicationState {
        match (self.applied, self.evaluated) {
            (_, true) => ApplicationState::Evaluated,
            (true, false) => ApplicationState::Applied,
            (false, false) => ApplicationState::NotApplied,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationState {
    NotApplied,
    Applied,
    Evaluated,
}

// ===== Inputs =====

/// Six external ciphertexts plus the attestation covering them, in the order
/// salary, experience, education, sex, email, phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndividualInput {
    pub expected_salary: Handle,
    pub experience: Handle,
    pub education: Handle,
    pub sex: Handle,
    pub contact_email: Handle,
    pub contact_phone: Handle,
    pub attestation: Attestation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInput {
    pub name: String,
    pub industry: String,
    pub website: String,
    pub contact_email: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInput {
    pub title: String,
    pub location: String,
    pub work_preference: WorkPreference,
    pub primary_field: PrimaryField,
    pub max_salary: Handle,
    pub min_experience: Handle,
    pub min_education: Handle,
    pub preferred_sex: Handle,
    pub attestation: Attestation,
    pub application_deadline: Timestamp,
    pub vacancy_count: u32,
}
