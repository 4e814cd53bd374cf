// src/auth.rs
use alloy_primitives::Address;
use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::{Request, State};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default lifetime of tokens minted by [`AuthConfig::issue_token`].
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Caller address, 0x-prefixed hex
    pub exp: usize,
    pub iat: usize,
}

pub struct AuthConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_seconds: u64,
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    /// Mint an HS256 bearer token for `address`.
    pub fn issue_token(&self, address: Address) -> Result<String> {
        let now = chrono::Utc::now().timestamp().max(0) as usize;
        let claims = Claims {
            sub: address.to_string(),
            iat: now,
            exp: now + self.token_ttl_seconds as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign token")
    }

    pub fn verify_token(&self, token: &str) -> Result<Address> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Token verification failed")?;
        token_data
            .claims
            .sub
            .parse::<Address>()
            .with_context(|| format!("Token subject is not an address: {}", token_data.claims.sub))
    }
}

/// Authenticated caller. Every ledger transaction is sent as this address.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub address: Address,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_config = match req.guard::<&State<AuthConfig>>().await {
            Outcome::Success(config) => config,
            Outcome::Error((status, _)) => return Outcome::Error((status, AuthError::NotConfigured)),
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let token = match req.headers().get_one("Authorization") {
            Some(header) => match header.strip_prefix("Bearer ") {
                Some(token) => token.trim(),
                None => {
                    warn!("Invalid Authorization header format");
                    return Outcome::Error((Status::Unauthorized, AuthError::InvalidToken));
                }
            },
            None => {
                debug!("Missing Authorization header");
                return Outcome::Error((Status::Unauthorized, AuthError::MissingToken));
            }
        };

        match auth_config.verify_token(token) {
            Ok(address) => {
                debug!("Authenticated caller {}", address);
                Outcome::Success(Caller { address })
            }
            Err(e) => {
                warn!("Token verification failed: {:#}", e);
                Outcome::Error((Status::Unauthorized, AuthError::TokenVerificationFailed))
            }
        }
    }
}

// Optional caller guard that doesn't fail if no auth is provided
pub struct OptionalCaller {
    pub caller: Option<Caller>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for OptionalCaller {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match Caller::from_request(req).await {
            Outcome::Success(caller) => Outcome::Success(OptionalCaller {
                caller: Some(caller),
            }),
            _ => Outcome::Success(OptionalCaller { caller: None }),
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenVerificationFailed,
    NotConfigured,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_round_trip() {
        let auth = AuthConfig::new("test-secret");
        let address = Address::repeat_byte(0xA1);
        let token = auth.issue_token(address).unwrap();
        assert_eq!(auth.verify_token(&token).unwrap(), address);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = AuthConfig::new("one").issue_token(Address::ZERO).unwrap();
        assert!(AuthConfig::new("two").verify_token(&token).is_err());
    }

    #[test]
    fn test_non_address_subject_rejected() {
        let auth = AuthConfig::new("test-secret");
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            iat: now,
            exp: now + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(auth.verify_token(&token).is_err());
    }
}
