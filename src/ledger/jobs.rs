// src/ledger/jobs.rs
//! Job registry. Jobs are immutable once created.

use tracing::{info, warn};

use super::{Ledger, LedgerError, Result};
use crate::fhe::{verify_u32, ComputeError, ConfidentialCompute};
use crate::types::{Job, JobId, JobInput, LedgerEvent, Tx};

impl<C: ConfidentialCompute> Ledger<C> {
    pub fn create_job(&mut self, tx: &Tx, input: JobInput) -> Result<JobId> {
        if !self.companies.get(&tx.sender).is_some_and(|c| c.exists) {
            warn!("Job creation by unregistered company {}", tx.sender);
            return Err(LedgerError::CompanyNotFound(tx.sender));
        }
        if input.application_deadline <= tx.timestamp {
            return Err(LedgerError::DeadlineNotInFuture {
                deadline: input.application_deadline,
                now: tx.timestamp,
            });
        }
        if input.vacancy_count < 1 {
            return Err(LedgerError::NoVacancies);
        }

        let compute = self.compute.as_ref();
        let origin = self.origin(tx);
        let att = &input.attestation;
        let thresholds = (|| -> std::result::Result<_, ComputeError> {
            Ok((
                verify_u32(compute, input.max_salary, att, origin)?,
                verify_u32(compute, input.min_experience, att, origin)?,
                verify_u32(compute, input.min_education, att, origin)?,
                verify_u32(compute, input.preferred_sex, att, origin)?,
            ))
        })()
        .map_err(|e| {
            warn!("Rejected encrypted job thresholds from {}: {}", tx.sender, e);
            LedgerError::InvalidCiphertext(e)
        })?;
        let (max_salary, min_experience, min_education, preferred_sex) = thresholds;

        for handle in [max_salary, min_experience, min_education, preferred_sex] {
            self.compute.allow(handle.handle(), tx.sender);
        }

        let job_id = self.next_job_id();
        let title = input.title.clone();
        self.jobs.push(Job {
            company: tx.sender,
            title: input.title,
            location: input.location,
            work_preference: input.work_preference,
            primary_field: input.primary_field,
            max_salary,
            min_experience,
            min_education,
            preferred_sex,
            application_deadline: input.application_deadline,
            vacancy_count: input.vacancy_count,
            exists: true,
        });

        info!("Job {} created by {}: {}", job_id, tx.sender, title);
        self.emit(
            tx,
            LedgerEvent::JobCreated {
                job_id,
                company: tx.sender,
                title,
            },
        );
        Ok(job_id)
    }

    pub fn next_job_id(&self) -> JobId {
        self.jobs.len() as JobId
    }

    pub fn job(&self, job_id: JobId) -> Option<&Job> {
        usize::try_from(job_id)
            .ok()
            .and_then(|i| self.jobs.get(i))
            .filter(|j| j.exists)
    }

    pub(crate) fn jobs_with_ids(&self) -> impl Iterator<Item = (JobId, &Job)> {
        self.jobs
            .iter()
            .enumerate()
            .filter(|(_, j)| j.exists)
            .map(|(i, j)| (i as JobId, j))
    }
}
