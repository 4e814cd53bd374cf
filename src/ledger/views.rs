// src/ledger/views.rs
//! Read-only projections over the ledger used by the API and CLI.

use alloy_primitives::Address;
use serde::Serialize;

use super::{Ledger, LedgerError, Result};
use crate::fhe::ConfidentialCompute;
use crate::types::{
    ApplicationState, Company, Individual, JobId, LedgerEvent, PrimaryField, Role, Timestamp,
    WorkPreference,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleSet {
    pub individual: bool,
    pub company: bool,
}

impl RoleSet {
    /// Individual wins when an address holds both profiles.
    pub fn default_role(&self) -> Role {
        match (self.individual, self.company) {
            (true, _) => Role::Individual,
            (false, true) => Role::Company,
            (false, false) => Role::None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub title: Option<String>,
    pub location: Option<String>,
    pub work_preference: Option<WorkPreference>,
    pub primary_field: Option<PrimaryField>,
}

impl JobFilter {
    fn matches(&self, title: &str, location: &str, wp: WorkPreference, pf: PrimaryField) -> bool {
        contains_ci(title, self.title.as_deref())
            && contains_ci(location, self.location.as_deref())
            && self.work_preference.map_or(true, |w| w == wp)
            && self.primary_field.map_or(true, |p| p == pf)
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobListing {
    pub job_id: JobId,
    pub company: Address,
    pub company_name: String,
    pub title: String,
    pub location: String,
    pub work_preference: WorkPreference,
    pub primary_field: PrimaryField,
    pub application_deadline: Timestamp,
    pub vacancy_count: u32,
    pub applicant_count: u64,
    /// State of the viewer's own application, if a viewer was given.
    pub viewer_state: ApplicationState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyJob {
    pub job_id: JobId,
    pub title: String,
    pub application_deadline: Timestamp,
    pub vacancy_count: u32,
    pub applicant_count: u64,
    pub evaluated_count: u64,
    pub evaluation_started: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobApplicant {
    pub applicant: Address,
    pub profile_version: u64,
    pub state: ApplicationState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSummary {
    pub job_id: JobId,
    pub title: String,
    pub profile_version: u64,
    pub state: ApplicationState,
}

impl<C: ConfidentialCompute> Ledger<C> {
    pub fn individual(&self, address: Address) -> Option<&Individual> {
        self.individuals.get(&address).filter(|p| p.exists)
    }

    pub fn company(&self, address: Address) -> Option<&Company> {
        self.companies.get(&address).filter(|c| c.exists)
    }

    pub fn roles(&self, address: Address) -> RoleSet {
        RoleSet {
            individual: self.individual(address).is_some(),
            company: self.company(address).is_some(),
        }
    }

    pub fn applicant_count(&self, job_id: JobId) -> u64 {
        self.index.stats(job_id).applicants
    }

    pub fn is_evaluation_started(&self, job_id: JobId) -> bool {
        self.index.stats(job_id).evaluation_started()
    }

    fn viewer_state(&self, job_id: JobId, viewer: Option<Address>) -> ApplicationState {
        viewer
            .and_then(|v| self.application(job_id, v))
            .map_or(ApplicationState::NotApplied, |a| a.state())
    }

    /// Job market: jobs still accepting applications, filtered and ordered for `viewer`.
    pub fn open_jobs(
        &self,
        now: Timestamp,
        viewer: Option<Address>,
        filter: &JobFilter,
    ) -> Vec<JobListing> {
        let mut listings: Vec<JobListing> = self
            .jobs_with_ids()
            .filter(|(id, job)| job.is_open_at(now) && !self.is_evaluation_started(*id))
            .filter(|(_, job)| {
                filter.matches(&job.title, &job.location, job.work_preference, job.primary_field)
            })
            .map(|(job_id, job)| JobListing {
                job_id,
                company: job.company,
                company_name: self
                    .company(job.company)
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                title: job.title.clone(),
                location: job.location.clone(),
                work_preference: job.work_preference,
                primary_field: job.primary_field,
                application_deadline: job.application_deadline,
                vacancy_count: job.vacancy_count,
                applicant_count: self.applicant_count(job_id),
                viewer_state: self.viewer_state(job_id, viewer),
            })
            .collect();

        listings.sort_by_key(|l| {
            (
                l.viewer_state == ApplicationState::Applied,
                l.application_deadline,
                l.job_id,
            )
        });
        listings
    }

    pub fn company_jobs(&self, company: Address) -> Vec<CompanyJob> {
        self.jobs_with_ids()
            .filter(|(_, job)| job.company == company)
            .map(|(job_id, job)| {
                let stats = self.index.stats(job_id);
                CompanyJob {
                    job_id,
                    title: job.title.clone(),
                    application_deadline: job.application_deadline,
                    vacancy_count: job.vacancy_count,
                    applicant_count: stats.applicants,
                    evaluated_count: stats.evaluated,
                    evaluation_started: stats.evaluation_started(),
                }
            })
            .collect()
    }

    pub fn applications_of(&self, applicant: Address) -> Vec<ApplicationSummary> {
        self.jobs_with_ids()
            .filter_map(|(job_id, job)| {
                self.application(job_id, applicant)
                    .filter(|a| a.applied)
                    .map(|a| ApplicationSummary {
                        job_id,
                        title: job.title.clone(),
                        profile_version: a.profile_version,
                        state: a.state(),
                    })
            })
            .collect()
    }

    /// Registered companies in registration order.
    pub fn companies(&self) -> Vec<&Company> {
        self.log
            .iter()
            .filter_map(|r| match &r.event {
                LedgerEvent::CompanyRegistered { company, .. } => self.company(*company),
                _ => None,
            })
            .collect()
    }

    /// Applicants of `job_id` in submission order. Only the job owner may list them.
    pub fn job_applicants(&self, caller: Address, job_id: JobId) -> Result<Vec<JobApplicant>> {
        let job = self.job(job_id).ok_or(LedgerError::JobNotFound(job_id))?;
        if job.company != caller {
            return Err(LedgerError::NotJobOwner { job_id, caller });
        }

        Ok(self
            .log
            .iter()
            .filter_map(|r| match &r.event {
                LedgerEvent::ApplicationSubmitted { job_id: id, applicant } if *id == job_id => {
                    self.application(job_id, *applicant).map(|a| JobApplicant {
                        applicant: *applicant,
                        profile_version: a.profile_version,
                        state: a.state(),
                    })
                }
                _ => None,
            })
            .collect())
    }
}
