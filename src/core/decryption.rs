// src/core/decryption.rs
use std::time::Duration;
use tracing::{info, warn};

use crate::fhe::{ClearValue, DecryptionError, DecryptionRequest, UserDecryption};

/// Run a user decryption with a per-attempt timeout, retrying transport failures.
///
/// Authorization and unknown-handle errors are returned immediately.
pub async fn decrypt_with_retry(
    decryptor: &dyn UserDecryption,
    request: &DecryptionRequest,
    attempts: u32,
    timeout: Duration,
) -> Result<ClearValue, DecryptionError> {
    let attempts = attempts.max(1);
    let mut last_error = DecryptionError::Timeout(timeout.as_secs());

    for attempt in 1..=attempts {
        let outcome = match tokio::time::timeout(timeout, decryptor.user_decrypt(request)).await {
            Ok(result) => result,
            Err(_) => Err(DecryptionError::Timeout(timeout.as_secs())),
        };

        match outcome {
            Ok(value) => {
                if attempt > 1 {
                    info!(
                        "Decryption {} succeeded on attempt {}",
                        request.request_id, attempt
                    );
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < attempts => {
                warn!(
                    "Decryption {} attempt {}/{} failed: {}",
                    request.request_id, attempt, attempts, e
                );
                last_error = e;
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::fhe::{ConfidentialCompute, Handle, MockCoprocessor};

    /// Fails `failures` times with the given error, then answers `true`.
    struct Scripted {
        failures: u32,
        error: DecryptionError,
        calls: AtomicU32,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl UserDecryption for Scripted {
        async fn user_decrypt(&self, _: &DecryptionRequest) -> Result<ClearValue, DecryptionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if call < self.failures {
                Err(self.error.clone())
            } else {
                Ok(ClearValue::Bool(true))
            }
        }
    }

    fn request() -> DecryptionRequest {
        DecryptionRequest::new(Handle::from(B256::ZERO), Address::ZERO, Address::ZERO)
    }

    #[tokio::test]
    async fn test_retries_relayer_errors() {
        let decryptor = Scripted {
            failures: 2,
            error: DecryptionError::Relayer("503".to_string()),
            calls: AtomicU32::new(0),
            delay: None,
        };
        let value = decrypt_with_retry(&decryptor, &request(), 3, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(value, ClearValue::Bool(true));
        assert_eq!(decryptor.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let decryptor = Scripted {
            failures: 5,
            error: DecryptionError::Relayer("503".to_string()),
            calls: AtomicU32::new(0),
            delay: None,
        };
        let err = decrypt_with_retry(&decryptor, &request(), 2, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, DecryptionError::Relayer("503".to_string()));
        assert_eq!(decryptor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authorization_failure_is_not_retried() {
        let decryptor = Scripted {
            failures: 5,
            error: DecryptionError::NotAuthorized {
                handle: Handle::from(B256::ZERO),
                requester: Address::ZERO,
            },
            calls: AtomicU32::new(0),
            delay: None,
        };
        let err = decrypt_with_retry(&decryptor, &request(), 3, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DecryptionError::NotAuthorized { .. }));
        assert_eq!(decryptor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_attempt_times_out() {
        let decryptor = Scripted {
            failures: 0,
            error: DecryptionError::Relayer(String::new()),
            calls: AtomicU32::new(0),
            delay: Some(Duration::from_millis(200)),
        };
        let err = decrypt_with_retry(&decryptor, &request(), 2, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, DecryptionError::Timeout(_)));
        assert_eq!(decryptor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mock_coprocessor_enforces_acl() {
        let mock = MockCoprocessor::new();
        let owner = Address::repeat_byte(1);
        let input = mock.encrypted_input(Address::ZERO, owner).add32(77).encrypt();
        let handle = input.handles[0];
        mock.allow(handle, owner);

        let ok = DecryptionRequest::new(handle, owner, Address::ZERO);
        let value = decrypt_with_retry(&mock, &ok, 3, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(value, ClearValue::U32(77));

        let denied = DecryptionRequest::new(handle, Address::repeat_byte(2), Address::ZERO);
        assert!(decrypt_with_retry(&mock, &denied, 3, Duration::from_secs(1))
            .await
            .is_err());
    }
}
