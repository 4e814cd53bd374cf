// src/web/handlers/system_handlers.rs
use crate::auth::{Caller, OptionalCaller};
use crate::core::decrypt_with_retry;
use crate::fhe::{ClearValue, DecryptionRequest};
use crate::web::state::AppState;
use crate::web::types::*;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{debug, error, info};

pub async fn health_handler(
    viewer: OptionalCaller,
    state: &State<AppState>,
) -> ApiResult<TextResponse> {
    match viewer.caller {
        Some(caller) => debug!("Health check by {}", caller.address),
        None => debug!("Health check by anonymous caller"),
    }

    if let Err(e) = state.store.health_check().await {
        error!("Event store health check failed: {:#}", e);
        return Err(api_error(
            Status::ServiceUnavailable,
            "Event store unavailable",
            "STORE_UNAVAILABLE",
            vec!["Try again in a few moments".to_string()],
            None,
        ));
    }

    let next_job_id = state.ledger().await.next_job_id();
    Ok(Json(TextResponse::success(
        format!("OK (next job id {})", next_job_id),
        None,
    )))
}

pub async fn my_roles_handler(caller: Caller, state: &State<AppState>) -> Json<DataResponse<RolesData>> {
    let roles = state.ledger().await.roles(caller.address);
    let default_role = roles.default_role();

    Json(DataResponse::success(
        format!("Default role is {:?}", default_role),
        RolesData {
            address: caller.address,
            individual: roles.individual,
            company: roles.company,
            default_role,
        },
        None,
    ))
}

/// Build an attested input bound to the ledger contract and the calling address.
pub async fn dev_encrypt_handler(
    request: Json<StandardRequest<EncryptRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<EncryptedInputData>> {
    let conversation_id = request.conversation_id();
    let values = request.into_inner().data.values;

    if values.is_empty() {
        return Err(api_error(
            Status::UnprocessableEntity,
            "At least one value is required",
            "EMPTY_INPUT",
            vec!["Pass values such as {\"type\": \"u32\", \"value\": 5}".to_string()],
            conversation_id,
        ));
    }

    let contract = state.ledger().await.contract();
    let input = values
        .iter()
        .fold(
            state.coprocessor.encrypted_input(contract, caller.address),
            |builder, value| match *value {
                ClearValue::Bool(v) => builder.add_bool(v),
                ClearValue::U32(v) => builder.add32(v),
                ClearValue::U256(v) => builder.add256(v),
            },
        )
        .encrypt();

    info!(
        "Encrypted {} values for {} on contract {}",
        input.handles.len(),
        caller.address,
        contract
    );
    Ok(Json(DataResponse::success(
        format!("{} values encrypted", input.handles.len()),
        EncryptedInputData {
            contract,
            sender: caller.address,
            handles: input.handles,
            attestation: input.attestation,
        },
        conversation_id,
    )))
}

pub async fn decrypt_handler(
    request: Json<StandardRequest<DecryptRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<DataResponse<DecryptedData>> {
    let conversation_id = request.conversation_id();
    let handle = request.into_inner().data.handle;

    let contract = state.ledger().await.contract();
    let decrypt_request = DecryptionRequest::new(handle, caller.address, contract);

    let value = decrypt_with_retry(
        &*state.decryptor,
        &decrypt_request,
        state.relayer.attempts,
        state.relayer.timeout(),
    )
    .await
    .map_err(|e| decryption_error(e, conversation_id.clone()))?;

    Ok(Json(DataResponse::success(
        "Decrypted".to_string(),
        DecryptedData {
            request_id: decrypt_request.request_id.to_string(),
            handle,
            value,
        },
        conversation_id,
    )))
}
