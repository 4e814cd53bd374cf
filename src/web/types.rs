// src/web/types.rs

use alloy_primitives::Address;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};

use crate::fhe::{Attestation, ClearValue, DecryptionError, Handle};
use crate::ledger::LedgerError;
use crate::types::{Application, ApplicationState, Individual, Job, JobId, Role};

// ===== Standard envelopes =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_actions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Action,
    Error,
}

// Request types with conversation_id support
#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardRequest<T> {
    #[serde(flatten)]
    pub data: T,
    pub conversation_id: Option<String>,
}

pub trait WithConversationId {
    fn conversation_id(&self) -> Option<String>;
}

impl<T> WithConversationId for StandardRequest<T> {
    fn conversation_id(&self) -> Option<String> {
        self.conversation_id.clone()
    }
}

impl TextResponse {
    pub fn success(message: String, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
            conversation_id,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
            conversation_id,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
            next_actions: None,
            conversation_id,
        }
    }

    pub fn with_next_actions(mut self, next_actions: Vec<String>) -> Self {
        self.next_actions = Some(next_actions);
        self
    }
}

impl StandardErrorResponse {
    pub fn new(
        error: String,
        error_code: String,
        suggestions: Vec<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
            conversation_id,
        }
    }
}

// ===== Errors =====

/// Error response with its HTTP status.
pub type ApiError = (Status, Json<StandardErrorResponse>);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn api_error(
    status: Status,
    error: impl Into<String>,
    code: &str,
    suggestions: Vec<String>,
    conversation_id: Option<String>,
) -> ApiError {
    (
        status,
        Json(StandardErrorResponse::new(
            error.into(),
            code.to_string(),
            suggestions,
            conversation_id,
        )),
    )
}

pub fn ledger_error(err: LedgerError, conversation_id: Option<String>) -> ApiError {
    let status = match &err {
        LedgerError::IndividualNotFound(_)
        | LedgerError::CompanyNotFound(_)
        | LedgerError::JobNotFound(_) => Status::NotFound,
        LedgerError::NotJobOwner { .. } => Status::Forbidden,
        LedgerError::AlreadyRegistered(_)
        | LedgerError::AlreadyApplied { .. }
        | LedgerError::EvaluationStarted(_) => Status::Conflict,
        LedgerError::DeadlineNotInFuture { .. }
        | LedgerError::NoVacancies
        | LedgerError::DeadlinePassed { .. }
        | LedgerError::InvalidCiphertext(_) => Status::UnprocessableEntity,
        LedgerError::Compute(_) => Status::InternalServerError,
    };

    let suggestions = match &err {
        LedgerError::IndividualNotFound(_) => vec!["Register an individual profile first".to_string()],
        LedgerError::CompanyNotFound(_) => vec!["Register a company profile first".to_string()],
        LedgerError::InvalidCiphertext(_) => vec![
            "Encrypt the inputs for this contract and your own address".to_string(),
            "Submit every handle with the attestation it was issued with".to_string(),
        ],
        LedgerError::Compute(_) => vec!["Try again in a few moments".to_string()],
        _ => Vec::new(),
    };

    api_error(status, err.to_string(), err.code(), suggestions, conversation_id)
}

pub fn decryption_error(err: DecryptionError, conversation_id: Option<String>) -> ApiError {
    let (status, code) = match &err {
        DecryptionError::NotAuthorized { .. } => (Status::Forbidden, "NOT_AUTHORIZED"),
        DecryptionError::UnknownHandle(_) => (Status::NotFound, "UNKNOWN_HANDLE"),
        DecryptionError::Timeout(_) => (Status::GatewayTimeout, "DECRYPT_TIMEOUT"),
        DecryptionError::Relayer(_) => (Status::BadGateway, "RELAYER_ERROR"),
    };
    api_error(status, err.to_string(), code, Vec::new(), conversation_id)
}

pub fn parse_address(raw: &str) -> Result<Address, ApiError> {
    raw.parse::<Address>().map_err(|_| {
        api_error(
            Status::BadRequest,
            format!("Invalid address: {}", raw),
            "INVALID_ADDRESS",
            vec!["Use a 0x-prefixed 20-byte hex address".to_string()],
            None,
        )
    })
}

// ===== Request bodies =====

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct EvaluateRequest {
    pub applicants: Vec<Address>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct EncryptRequest {
    pub values: Vec<ClearValue>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct DecryptRequest {
    pub handle: Handle,
}

// ===== Response payloads =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct IndividualData {
    pub address: Address,
    pub profile: Individual,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct JobData {
    pub job_id: JobId,
    pub job: Job,
    pub applicant_count: u64,
    pub evaluation_started: bool,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct JobCreatedData {
    pub job_id: JobId,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ApplicationData {
    pub job_id: JobId,
    pub applicant: Address,
    pub state: ApplicationState,
    pub application: Application,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct JobStatsData {
    pub job_id: JobId,
    pub applicants: u64,
    pub evaluated: u64,
    pub evaluation_started: bool,
    /// Applicant count as seen by the indexed event store.
    pub indexed_applicants: Option<u64>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct RolesData {
    pub address: Address,
    pub individual: bool,
    pub company: bool,
    pub default_role: Role,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct EncryptedInputData {
    pub contract: Address,
    pub sender: Address,
    pub handles: Vec<Handle>,
    pub attestation: Attestation,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DecryptedData {
    pub request_id: String,
    pub handle: Handle,
    pub value: ClearValue,
}
