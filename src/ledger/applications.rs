// src/ledger/applications.rs
//! Application ledger: one snapshot per (job, applicant).

use alloy_primitives::Address;
use tracing::{info, warn};

use super::{Ledger, LedgerError, Result};
use crate::fhe::ConfidentialCompute;
use crate::types::{Application, JobId, LedgerEvent, Tx};

impl<C: ConfidentialCompute> Ledger<C> {
    /// Snapshot the caller's current encrypted profile into a new application.
    ///
    /// The snapshot shares ciphertext handles with the profile as it is right now; a
    /// later profile update stores new handles and leaves this record untouched.
    pub fn apply_for_job(&mut self, tx: &Tx, job_id: JobId) -> Result<()> {
        let job = self.job(job_id).ok_or(LedgerError::JobNotFound(job_id))?;
        if !job.is_open_at(tx.timestamp) {
            return Err(LedgerError::DeadlinePassed {
                job_id,
                deadline: job.application_deadline,
            });
        }

        let profile = match self.individuals.get(&tx.sender) {
            Some(p) if p.exists => p,
            _ => return Err(LedgerError::IndividualNotFound(tx.sender)),
        };

        if self
            .applications
            .get(&(job_id, tx.sender))
            .is_some_and(|a| a.applied)
        {
            warn!("Duplicate application by {} to job {}", tx.sender, job_id);
            return Err(LedgerError::AlreadyApplied {
                job_id,
                applicant: tx.sender,
            });
        }

        if self.policy.close_jobs_on_evaluation && self.index.stats(job_id).evaluation_started() {
            warn!("Application by {} to job {} after evaluation started", tx.sender, job_id);
            return Err(LedgerError::EvaluationStarted(job_id));
        }

        let application = Application::snapshot(profile);
        let version = application.profile_version;
        self.applications.insert((job_id, tx.sender), application);

        info!(
            "Application submitted: job {} by {} (profile v{})",
            job_id, tx.sender, version
        );
        self.emit(
            tx,
            LedgerEvent::ApplicationSubmitted {
                job_id,
                applicant: tx.sender,
            },
        );
        Ok(())
    }

    pub fn application(&self, job_id: JobId, applicant: Address) -> Option<&Application> {
        self.applications.get(&(job_id, applicant))
    }
}
