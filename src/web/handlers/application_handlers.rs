// src/web/handlers/application_handlers.rs

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use crate::auth::Caller;
use crate::ledger::{ApplicationSummary, EvaluationReport, JobApplicant};
use crate::types::JobId;
use crate::web::state::AppState;
use crate::web::types::{
    api_error, ledger_error, parse_address, ActionResponse, ApiResult, ApplicationData,
    DataResponse, EvaluateRequest, StandardRequest, WithConversationId,
};

pub async fn apply_handler(
    job_id: JobId,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    state
        .commit(caller.address, |ledger, tx| ledger.apply_for_job(tx, job_id))
        .await
        .map_err(|e| ledger_error(e, None))?;

    Ok(Json(
        ActionResponse::success(
            format!("Applied to job {}", job_id),
            "applied".to_string(),
            None,
        )
        .with_next_actions(vec![
            "Wait for the company to evaluate applicants".to_string(),
            "Decrypt your eligibility once evaluated".to_string(),
        ]),
    ))
}

pub async fn evaluate_handler(
    job_id: JobId,
    request: Json<StandardRequest<EvaluateRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<EvaluationReport>> {
    let conversation_id = request.conversation_id();
    let applicants = request.into_inner().data.applicants;

    let report = state
        .commit(caller.address, |ledger, tx| {
            ledger.evaluate_all_applicants(tx, job_id, &applicants)
        })
        .await
        .map_err(|e| ledger_error(e, conversation_id.clone()))?;

    info!(
        "Job {} evaluated via API: {} processed",
        job_id,
        report.evaluated.len()
    );
    Ok(Json(DataResponse::success(
        format!(
            "{} applicants evaluated, {} skipped",
            report.evaluated.len(),
            report.skipped.len()
        ),
        report,
        conversation_id,
    )))
}

pub async fn get_application_handler(
    job_id: JobId,
    applicant: &str,
    state: &State<AppState>,
) -> ApiResult<DataResponse<ApplicationData>> {
    let applicant = parse_address(applicant)?;
    let ledger = state.ledger().await;
    let application = ledger.application(job_id, applicant).cloned().ok_or_else(|| {
        api_error(
            Status::NotFound,
            format!("{} has not applied to job {}", applicant, job_id),
            "APPLICATION_NOT_FOUND",
            Vec::new(),
            None,
        )
    })?;

    Ok(Json(DataResponse::success(
        format!("Application is {:?}", application.state()),
        ApplicationData {
            job_id,
            applicant,
            state: application.state(),
            application,
        },
        None,
    )))
}

pub async fn my_applications_handler(
    caller: Caller,
    state: &State<AppState>,
) -> Json<DataResponse<Vec<ApplicationSummary>>> {
    let applications = state.ledger().await.applications_of(caller.address);
    Json(DataResponse::success(
        format!("{} applications", applications.len()),
        applications,
        None,
    ))
}

pub async fn job_applicants_handler(
    job_id: JobId,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Vec<JobApplicant>>> {
    let applicants = state
        .ledger()
        .await
        .job_applicants(caller.address, job_id)
        .map_err(|e| ledger_error(e, None))?;

    Ok(Json(DataResponse::success(
        format!("{} applicants for job {}", applicants.len(), job_id),
        applicants,
        None,
    )))
}
