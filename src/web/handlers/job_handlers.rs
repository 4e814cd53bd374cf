// src/web/handlers/job_handlers.rs

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{info, warn};

use crate::auth::{Caller, OptionalCaller};
use crate::core::EventRepository;
use crate::ledger::{CompanyJob, JobFilter, JobListing, LedgerError};
use crate::types::{unix_now, JobId, JobInput, PrimaryField, WorkPreference};
use crate::web::state::AppState;
use crate::web::types::{
    api_error, ledger_error, ApiError, ApiResult, DataResponse, JobCreatedData, JobData,
    JobStatsData, StandardRequest, WithConversationId,
};

pub async fn create_job_handler(
    request: Json<StandardRequest<JobInput>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<JobCreatedData>> {
    let conversation_id = request.conversation_id();
    let input = request.into_inner().data;

    let job_id = state
        .commit(caller.address, |ledger, tx| ledger.create_job(tx, input))
        .await
        .map_err(|e| ledger_error(e, conversation_id.clone()))?;

    info!("Job {} posted via API by {}", job_id, caller.address);
    Ok(Json(DataResponse::success(
        format!("Job {} created", job_id),
        JobCreatedData { job_id },
        conversation_id,
    )))
}

pub async fn get_job_handler(job_id: JobId, state: &State<AppState>) -> ApiResult<DataResponse<JobData>> {
    let ledger = state.ledger().await;
    let job = ledger
        .job(job_id)
        .cloned()
        .ok_or_else(|| ledger_error(LedgerError::JobNotFound(job_id), None))?;

    let data = JobData {
        job_id,
        applicant_count: ledger.applicant_count(job_id),
        evaluation_started: ledger.is_evaluation_started(job_id),
        job,
    };
    Ok(Json(DataResponse::success(data.job.title.clone(), data, None)))
}

fn enum_filter<T: TryFrom<u8>>(raw: Option<u8>, name: &str) -> Result<Option<T>, ApiError> {
    raw.map(|v| {
        T::try_from(v).map_err(|_| {
            api_error(
                Status::BadRequest,
                format!("Invalid {} filter: {}", name, v),
                "INVALID_FILTER",
                Vec::new(),
                None,
            )
        })
    })
    .transpose()
}

pub async fn list_jobs_handler(
    title: Option<String>,
    location: Option<String>,
    work_preference: Option<u8>,
    primary_field: Option<u8>,
    viewer: OptionalCaller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Vec<JobListing>>> {
    let filter = JobFilter {
        title,
        location,
        work_preference: enum_filter::<WorkPreference>(work_preference, "work_preference")?,
        primary_field: enum_filter::<PrimaryField>(primary_field, "primary_field")?,
    };

    let ledger = state.ledger().await;
    let listings = ledger.open_jobs(unix_now(), viewer.caller.map(|c| c.address), &filter);

    Ok(Json(DataResponse::success(
        format!("{} open jobs", listings.len()),
        listings,
        None,
    )))
}

pub async fn job_stats_handler(
    job_id: JobId,
    state: &State<AppState>,
) -> ApiResult<DataResponse<JobStatsData>> {
    let (stats, exists) = {
        let ledger = state.ledger().await;
        (ledger.index().stats(job_id), ledger.job(job_id).is_some())
    };
    if !exists {
        return Err(ledger_error(LedgerError::JobNotFound(job_id), None));
    }

    let repo = EventRepository::new(state.store.pool());
    let indexed_applicants = match repo.applicant_count(&state.run_id, job_id).await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("Event store unavailable for job {} stats: {:#}", job_id, e);
            None
        }
    };

    Ok(Json(DataResponse::success(
        format!("Job {} statistics", job_id),
        JobStatsData {
            job_id,
            applicants: stats.applicants,
            evaluated: stats.evaluated,
            evaluation_started: stats.evaluation_started(),
            indexed_applicants,
        },
        None,
    )))
}

pub async fn next_job_id_handler(state: &State<AppState>) -> Json<DataResponse<JobId>> {
    let next = state.ledger().await.next_job_id();
    Json(DataResponse::success(
        format!("Next job id is {}", next),
        next,
        None,
    ))
}

pub async fn my_jobs_handler(caller: Caller, state: &State<AppState>) -> Json<DataResponse<Vec<CompanyJob>>> {
    let jobs = state.ledger().await.company_jobs(caller.address);
    Json(DataResponse::success(
        format!("{} jobs posted", jobs.len()),
        jobs,
        None,
    ))
}
