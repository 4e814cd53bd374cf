use serde::{Deserialize, Serialize};

use crate::fhe::ClearValue;

// ===== Relayer Wire Types =====

#[derive(Debug, Serialize, Deserialize)]
pub struct UserDecryptResponse {
    pub request_id: String,
    pub status: String,
    pub value: Option<ClearValue>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelayerErrorResponse {
    pub error: String,
    pub code: Option<String>,
}
