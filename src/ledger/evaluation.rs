// src/ledger/evaluation.rs
//! Evaluation & disclosure engine.
//!
//! Eligibility is the encrypted conjunction
//! `salary <= max_salary && experience >= min_experience && education >= min_education
//! && sex == preferred_sex`. The result is granted to both parties. Contact fields are
//! granted to the company through a conditional grant keyed on that encrypted result,
//! so a non-eligible applicant's contact data stays readable only by the applicant.

use alloy_primitives::Address;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::{Ledger, LedgerError, Result};
use crate::fhe::{and_bool, eq_u32, ge_u32, le_u32, ComputeError, ConfidentialCompute, Ebool};
use crate::types::{Application, Job, JobId, LedgerEvent, Tx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotApplied,
    AlreadyEvaluated,
    DuplicateInBatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationReport {
    pub job_id: JobId,
    /// Applicants whose state moved to evaluated, in batch order.
    pub evaluated: Vec<Address>,
    pub skipped: Vec<(Address, SkipReason)>,
}

impl<C: ConfidentialCompute> Ledger<C> {
    /// Evaluate a batch of applicants for one job. Only the owning company may call this.
    ///
    /// Addresses without an application, and applications already evaluated, are
    /// skipped rather than failing the batch. If the coprocessor rejects any computation
    /// the whole batch reverts.
    pub fn evaluate_all_applicants(
        &mut self,
        tx: &Tx,
        job_id: JobId,
        applicants: &[Address],
    ) -> Result<EvaluationReport> {
        let job = self.job(job_id).ok_or(LedgerError::JobNotFound(job_id))?;
        if job.company != tx.sender {
            warn!("{} tried to evaluate job {} owned by {}", tx.sender, job_id, job.company);
            return Err(LedgerError::NotJobOwner {
                job_id,
                caller: tx.sender,
            });
        }

        let mut report = EvaluationReport {
            job_id,
            ..Default::default()
        };
        let mut seen = HashSet::new();
        let mut staged: Vec<(Address, Ebool)> = Vec::new();

        for &applicant in applicants {
            if !seen.insert(applicant) {
                report.skipped.push((applicant, SkipReason::DuplicateInBatch));
                continue;
            }
            let application = match self.applications.get(&(job_id, applicant)) {
                Some(a) if a.applied => a,
                _ => {
                    debug!("Skipping {} for job {}: no application", applicant, job_id);
                    report.skipped.push((applicant, SkipReason::NotApplied));
                    continue;
                }
            };
            if application.evaluated {
                debug!("Skipping {} for job {}: already evaluated", applicant, job_id);
                report.skipped.push((applicant, SkipReason::AlreadyEvaluated));
                continue;
            }

            let eligible = compute_eligibility(self.compute.as_ref(), job, application)
                .map_err(|e| {
                    warn!("Eligibility computation failed for job {}: {}", job_id, e);
                    LedgerError::Compute(e)
                })?;
            staged.push((applicant, eligible));
        }

        // Every computation succeeded; commit.
        let company = job.company;
        for (applicant, eligible) in staged {
            let Some(application) = self.applications.get_mut(&(job_id, applicant)) else {
                continue;
            };
            application.eligible = Some(eligible);
            application.evaluated = true;
            let (email, phone) = (
                application.contact_email.handle(),
                application.contact_phone.handle(),
            );

            self.compute.allow(eligible.handle(), applicant);
            self.compute.allow(eligible.handle(), company);
            self.compute.allow_if(eligible.handle(), email, company);
            self.compute.allow_if(eligible.handle(), phone, company);

            report.evaluated.push(applicant);
            self.emit(tx, LedgerEvent::ApplicantEvaluated { job_id, applicant });
        }

        info!(
            "Job {} evaluation: {} evaluated, {} skipped",
            job_id,
            report.evaluated.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}

fn compute_eligibility<C: ConfidentialCompute + ?Sized>(
    compute: &C,
    job: &Job,
    application: &Application,
) -> std::result::Result<Ebool, ComputeError> {
    let salary_ok = le_u32(compute, application.salary, job.max_salary)?;
    let experience_ok = ge_u32(compute, application.experience, job.min_experience)?;
    let education_ok = ge_u32(compute, application.education, job.min_education)?;
    let sex_ok = eq_u32(compute, application.sex, job.preferred_sex)?;

    let eligible = and_bool(compute, salary_ok, experience_ok)?;
    let eligible = and_bool(compute, eligible, education_ok)?;
    and_bool(compute, eligible, sex_ok)
}
