// src/web/mod.rs

pub mod handlers;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

pub use handlers::*;
pub use state::AppState;
pub use types::*;

use crate::auth::{AuthConfig, Caller, OptionalCaller};
use crate::core::{ConfigManager, Database, EventRepository, RelayerClient};
use crate::fhe::{MockCoprocessor, UserDecryption};
use crate::ledger::{
    ApplicationSummary, CompanyJob, EvaluationReport, JobApplicant, JobListing, Ledger,
};
use crate::types::{Company, CompanyInput, IndividualInput, JobId, JobInput};
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use tracing::{error, info};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

// ===== Identity =====

#[post("/individuals/register", data = "<request>")]
pub async fn register_individual(
    request: Json<StandardRequest<IndividualInput>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    handlers::register_individual_handler(request, caller, state).await
}

#[post("/individuals/update", data = "<request>")]
pub async fn update_individual(
    request: Json<StandardRequest<IndividualInput>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    handlers::update_individual_handler(request, caller, state).await
}

#[get("/individuals/<address>")]
pub async fn get_individual(
    address: &str,
    state: &State<AppState>,
) -> ApiResult<DataResponse<IndividualData>> {
    handlers::get_individual_handler(address, state).await
}

#[post("/companies/register", data = "<request>")]
pub async fn register_company(
    request: Json<StandardRequest<CompanyInput>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    handlers::register_company_handler(request, caller, state).await
}

#[post("/companies/update", data = "<request>")]
pub async fn update_company(
    request: Json<StandardRequest<CompanyInput>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    handlers::update_company_handler(request, caller, state).await
}

#[get("/companies/<address>")]
pub async fn get_company(address: &str, state: &State<AppState>) -> ApiResult<DataResponse<Company>> {
    handlers::get_company_handler(address, state).await
}

#[get("/companies")]
pub async fn list_companies(state: &State<AppState>) -> Json<DataResponse<Vec<Company>>> {
    handlers::list_companies_handler(state).await
}

// ===== Jobs =====

#[post("/jobs", data = "<request>")]
pub async fn create_job(
    request: Json<StandardRequest<JobInput>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<JobCreatedData>> {
    handlers::create_job_handler(request, caller, state).await
}

#[get("/jobs?<title>&<location>&<work_preference>&<primary_field>")]
pub async fn list_jobs(
    title: Option<String>,
    location: Option<String>,
    work_preference: Option<u8>,
    primary_field: Option<u8>,
    viewer: OptionalCaller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Vec<JobListing>>> {
    handlers::list_jobs_handler(title, location, work_preference, primary_field, viewer, state)
        .await
}

#[get("/jobs/<job_id>")]
pub async fn get_job(job_id: JobId, state: &State<AppState>) -> ApiResult<DataResponse<JobData>> {
    handlers::get_job_handler(job_id, state).await
}

#[get("/jobs/<job_id>/stats")]
pub async fn job_stats(
    job_id: JobId,
    state: &State<AppState>,
) -> ApiResult<DataResponse<JobStatsData>> {
    handlers::job_stats_handler(job_id, state).await
}

#[get("/me/jobs")]
pub async fn my_jobs(caller: Caller, state: &State<AppState>) -> Json<DataResponse<Vec<CompanyJob>>> {
    handlers::my_jobs_handler(caller, state).await
}

#[get("/next-job-id")]
pub async fn next_job_id(state: &State<AppState>) -> Json<DataResponse<JobId>> {
    handlers::next_job_id_handler(state).await
}

// ===== Applications =====

#[post("/jobs/<job_id>/apply")]
pub async fn apply(
    job_id: JobId,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    handlers::apply_handler(job_id, caller, state).await
}

#[post("/jobs/<job_id>/evaluate", data = "<request>")]
pub async fn evaluate(
    job_id: JobId,
    request: Json<StandardRequest<EvaluateRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<EvaluationReport>> {
    handlers::evaluate_handler(job_id, request, caller, state).await
}

#[get("/jobs/<job_id>/applicants")]
pub async fn job_applicants(
    job_id: JobId,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Vec<JobApplicant>>> {
    handlers::job_applicants_handler(job_id, caller, state).await
}

#[get("/jobs/<job_id>/applications/<applicant>")]
pub async fn get_application(
    job_id: JobId,
    applicant: &str,
    state: &State<AppState>,
) -> ApiResult<DataResponse<ApplicationData>> {
    handlers::get_application_handler(job_id, applicant, state).await
}

#[get("/me/applications")]
pub async fn my_applications(
    caller: Caller,
    state: &State<AppState>,
) -> Json<DataResponse<Vec<ApplicationSummary>>> {
    handlers::my_applications_handler(caller, state).await
}

// ===== System =====

#[get("/me/roles")]
pub async fn my_roles(caller: Caller, state: &State<AppState>) -> Json<DataResponse<RolesData>> {
    handlers::my_roles_handler(caller, state).await
}

#[get("/health")]
pub async fn health(viewer: OptionalCaller, state: &State<AppState>) -> ApiResult<TextResponse> {
    handlers::health_handler(viewer, state).await
}

#[post("/dev/encrypt", data = "<request>")]
pub async fn dev_encrypt(
    request: Json<StandardRequest<EncryptRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<EncryptedInputData>> {
    handlers::dev_encrypt_handler(request, caller, state).await
}

#[post("/decrypt", data = "<request>")]
pub async fn decrypt(
    request: Json<StandardRequest<DecryptRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<DecryptedData>> {
    handlers::decrypt_handler(request, caller, state).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
        None,
    ))
}

#[rocket::catch(401)]
pub fn unauthorized() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Authentication required".to_string(),
        "UNAUTHORIZED".to_string(),
        vec!["Send Authorization: Bearer <token> for your address".to_string()],
        None,
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Resource not found".to_string(),
        "NOT_FOUND".to_string(),
        Vec::new(),
        None,
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body does not match the expected shape".to_string(),
        "UNPROCESSABLE_ENTITY".to_string(),
        vec!["Handles and attestations are 0x-prefixed 32-byte hex strings".to_string()],
        None,
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
        None,
    ))
}

/// Attach state, routes and catchers to `base`.
pub fn build_rocket(base: Rocket<Build>, state: AppState, auth: AuthConfig) -> Rocket<Build> {
    base.attach(Cors)
        .manage(state)
        .manage(auth)
        .register(
            "/api",
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                register_individual,
                update_individual,
                get_individual,
                register_company,
                update_company,
                get_company,
                list_companies,
                create_job,
                list_jobs,
                get_job,
                job_stats,
                my_jobs,
                next_job_id,
                apply,
                evaluate,
                job_applicants,
                get_application,
                my_applications,
                my_roles,
                health,
                dev_encrypt,
                decrypt,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    let database_path = config.environment.database_path.clone();
    let store = match Database::new(&database_path).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize event store: {:#}", e);
            return Err(e);
        }
    };

    let contract = config.environment.contract_address;
    let run = EventRepository::new(store.pool())
        .start_run(&contract.to_string())
        .await?;

    let coprocessor = Arc::new(MockCoprocessor::new());
    let ledger = Ledger::new(coprocessor.clone(), contract).with_policy(config.ledger_policy());

    let decryptor: Arc<dyn UserDecryption> = match &config.relayer.url {
        Some(url) => {
            info!("User decryption via relayer at {}", url);
            Arc::new(RelayerClient::new(url.clone(), config.relayer.timeout_seconds)?)
        }
        None => {
            info!("User decryption via in-process coprocessor");
            coprocessor
        }
    };

    let state = AppState::new(ledger, decryptor, store, run.id.clone(), config.relayer.clone());
    let auth = AuthConfig::new(&config.server.jwt_secret);

    info!("Starting FHE Junction API server");
    info!("Contract: {}", contract);
    info!("Event store: {} (run {})", database_path.display(), run.id);
    info!("Server: http://0.0.0.0:{}", config.server.port);

    let figment = rocket::Config::figment()
        .merge(("port", config.server.port))
        .merge(("address", "0.0.0.0"));

    build_rocket(rocket::custom(figment), state, auth)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Server failed: {}", e))?;

    Ok(())
}
