// src/web/handlers/identity_handlers.rs

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use crate::auth::Caller;
use crate::ledger::LedgerError;
use crate::types::{Company, CompanyInput, IndividualInput};
use crate::web::state::AppState;
use crate::web::types::{
    api_error, ledger_error, parse_address, ActionResponse, ApiResult, DataResponse,
    IndividualData, StandardRequest, WithConversationId,
};

pub async fn register_individual_handler(
    request: Json<StandardRequest<IndividualInput>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    let conversation_id = request.conversation_id();
    let input = request.into_inner().data;

    state
        .commit(caller.address, |ledger, tx| ledger.register_individual(tx, input))
        .await
        .map_err(|e| ledger_error(e, conversation_id.clone()))?;

    info!("Individual profile registered via API for {}", caller.address);
    Ok(Json(
        ActionResponse::success(
            "Individual profile registered".to_string(),
            "individual_registered".to_string(),
            conversation_id,
        )
        .with_next_actions(vec!["Browse open jobs".to_string()]),
    ))
}

pub async fn update_individual_handler(
    request: Json<StandardRequest<IndividualInput>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    let conversation_id = request.conversation_id();
    let input = request.into_inner().data;

    state
        .commit(caller.address, |ledger, tx| {
            ledger.update_individual_profile(tx, input)
        })
        .await
        .map_err(|e| ledger_error(e, conversation_id.clone()))?;

    Ok(Json(ActionResponse::success(
        "Individual profile updated".to_string(),
        "individual_updated".to_string(),
        conversation_id,
    )))
}

pub async fn register_company_handler(
    request: Json<StandardRequest<CompanyInput>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    let conversation_id = request.conversation_id();
    let input = request.into_inner().data;

    if input.name.trim().is_empty() {
        return Err(api_error(
            Status::UnprocessableEntity,
            "Company name is required",
            "INVALID_COMPANY",
            vec!["Provide a non-empty company name".to_string()],
            conversation_id,
        ));
    }

    state
        .commit(caller.address, |ledger, tx| ledger.register_company(tx, input))
        .await
        .map_err(|e| ledger_error(e, conversation_id.clone()))?;

    Ok(Json(
        ActionResponse::success(
            "Company profile registered".to_string(),
            "company_registered".to_string(),
            conversation_id,
        )
        .with_next_actions(vec!["Post a job".to_string()]),
    ))
}

pub async fn update_company_handler(
    request: Json<StandardRequest<CompanyInput>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<ActionResponse> {
    let conversation_id = request.conversation_id();
    let input = request.into_inner().data;

    state
        .commit(caller.address, |ledger, tx| {
            ledger.update_company_profile(tx, input)
        })
        .await
        .map_err(|e| ledger_error(e, conversation_id.clone()))?;

    Ok(Json(ActionResponse::success(
        "Company profile updated".to_string(),
        "company_updated".to_string(),
        conversation_id,
    )))
}

pub async fn get_individual_handler(
    address: &str,
    state: &State<AppState>,
) -> ApiResult<DataResponse<IndividualData>> {
    let address = parse_address(address)?;
    let ledger = state.ledger().await;
    let profile = ledger
        .individual(address)
        .cloned()
        .ok_or_else(|| ledger_error(LedgerError::IndividualNotFound(address), None))?;

    Ok(Json(DataResponse::success(
        format!("Profile version {}", profile.version),
        IndividualData { address, profile },
        None,
    )))
}

pub async fn get_company_handler(
    address: &str,
    state: &State<AppState>,
) -> ApiResult<DataResponse<Company>> {
    let address = parse_address(address)?;
    let ledger = state.ledger().await;
    let company = ledger
        .company(address)
        .cloned()
        .ok_or_else(|| ledger_error(LedgerError::CompanyNotFound(address), None))?;

    Ok(Json(DataResponse::success(
        company.name.clone(),
        company,
        None,
    )))
}

pub async fn list_companies_handler(state: &State<AppState>) -> Json<DataResponse<Vec<Company>>> {
    let ledger = state.ledger().await;
    let companies: Vec<Company> = ledger.companies().into_iter().cloned().collect();
    Json(DataResponse::success(
        format!("{} companies registered", companies.len()),
        companies,
        None,
    ))
}
