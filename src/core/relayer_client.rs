// src/core/relayer_client.rs
//! HTTP client for the decryption relayer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::fhe::{ClearValue, DecryptionError, DecryptionRequest, UserDecryption};
use crate::types::response::{RelayerErrorResponse, UserDecryptResponse};

const USER_DECRYPT_ENDPOINT: &str = "/v1/user-decrypt";

pub struct RelayerClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayerClient {
    pub fn new(base_url: String, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, USER_DECRYPT_ENDPOINT)
    }
}

#[async_trait]
impl UserDecryption for RelayerClient {
    async fn user_decrypt(&self, request: &DecryptionRequest) -> Result<ClearValue, DecryptionError> {
        let url = self.endpoint();
        info!(
            "Requesting user decryption {} from {}",
            request.request_id, url
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| DecryptionError::Relayer(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        debug!("Relayer response status: {}", status);

        if status.is_success() {
            let body: UserDecryptResponse = response.json().await.map_err(|e| {
                DecryptionError::Relayer(format!("Failed to parse relayer response: {}", e))
            })?;

            return match (body.status.as_str(), body.value) {
                ("success", Some(value)) => Ok(value),
                (other, _) => Err(DecryptionError::Relayer(
                    body.message
                        .unwrap_or_else(|| format!("Decryption returned status {}", other)),
                )),
            };
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let detail = serde_json::from_str::<RelayerErrorResponse>(&error_text)
            .map(|e| e.error)
            .unwrap_or(error_text);

        match status {
            StatusCode::FORBIDDEN => Err(DecryptionError::NotAuthorized {
                handle: request.handle,
                requester: request.requester,
            }),
            StatusCode::NOT_FOUND => Err(DecryptionError::UnknownHandle(request.handle)),
            _ => {
                error!("Relayer error response {}: {}", status, detail);
                Err(DecryptionError::Relayer(format!(
                    "Relayer returned {}: {}",
                    status, detail
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = RelayerClient::new("http://relayer:7000/".to_string(), 5).unwrap();
        assert_eq!(client.endpoint(), "http://relayer:7000/v1/user-decrypt");
    }

    #[tokio::test]
    async fn test_unreachable_relayer_is_retryable() {
        let client = RelayerClient::new("http://127.0.0.1:9".to_string(), 1).unwrap();
        let request = DecryptionRequest::new(
            crate::fhe::Handle::from(alloy_primitives::B256::ZERO),
            alloy_primitives::Address::ZERO,
            alloy_primitives::Address::ZERO,
        );
        let err = client.user_decrypt(&request).await.unwrap_err();
        assert!(matches!(err, DecryptionError::Relayer(_)));
        assert!(err.is_retryable());
    }
}
