// src/fhe/mod.rs
//! Seam to the external confidential-compute layer (FHE coprocessor + relayer).
//!
//! The ledger never sees plaintext. It asks the coprocessor to verify attested inputs,
//! to combine ciphertexts, and to record who may decrypt what. User decryption is a
//! separate, asynchronous capability that only reads.

pub mod handle;
pub mod mock;

pub use handle::{Attestation, CipherKind, Ebool, Euint256, Euint32, Handle};
pub use mock::{EncryptedInput, InputBuilder, MockCoprocessor};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Who submitted an external ciphertext and for which contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputOrigin {
    pub contract: Address,
    pub sender: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Le,
    Ge,
    Eq,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    #[error("Unknown ciphertext handle: {0}")]
    UnknownHandle(Handle),

    #[error("Attestation is not recognised by the coprocessor")]
    InvalidAttestation,

    #[error("Attestation was issued for {expected}, not {actual}")]
    AttestationMismatch { expected: Address, actual: Address },

    #[error("Handle {0} is not covered by the attestation")]
    HandleNotAttested(Handle),

    #[error("Ciphertext kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: CipherKind, found: CipherKind },
}

/// Capability interface of the FHE coprocessor.
///
/// Implementations must be internally synchronised; the ledger shares one instance
/// behind an `Arc`.
pub trait ConfidentialCompute: Send + Sync {
    /// Check `attestation` binds `ext` to `kind`, the contract and the sender, and
    /// return the handle usable on-ledger.
    fn verify_input(
        &self,
        ext: Handle,
        kind: CipherKind,
        attestation: &Attestation,
        origin: InputOrigin,
    ) -> Result<Handle, ComputeError>;

    fn compare(&self, op: CompareOp, lhs: Handle, rhs: Handle) -> Result<Handle, ComputeError>;

    fn and(&self, lhs: Handle, rhs: Handle) -> Result<Handle, ComputeError>;

    /// Encrypted multiplexer: `cond ? if_true : if_false`.
    fn select(&self, cond: Handle, if_true: Handle, if_false: Handle)
        -> Result<Handle, ComputeError>;

    fn allow(&self, handle: Handle, party: Address);

    /// Grant `party` access to `handle` only if `cond` holds. The predicate is resolved
    /// inside the coprocessor and is never revealed to the caller.
    fn allow_if(&self, cond: Handle, handle: Handle, party: Address);

    /// Public view of unconditional grants only.
    fn is_allowed(&self, handle: Handle, party: Address) -> bool;
}

pub fn verify_u32<C: ConfidentialCompute + ?Sized>(
    compute: &C,
    ext: Handle,
    attestation: &Attestation,
    origin: InputOrigin,
) -> Result<Euint32, ComputeError> {
    compute
        .verify_input(ext, CipherKind::U32, attestation, origin)
        .map(Euint32::from_handle)
}

pub fn verify_u256<C: ConfidentialCompute + ?Sized>(
    compute: &C,
    ext: Handle,
    attestation: &Attestation,
    origin: InputOrigin,
) -> Result<Euint256, ComputeError> {
    compute
        .verify_input(ext, CipherKind::U256, attestation, origin)
        .map(Euint256::from_handle)
}

pub fn le_u32<C: ConfidentialCompute + ?Sized>(
    compute: &C,
    lhs: Euint32,
    rhs: Euint32,
) -> Result<Ebool, ComputeError> {
    compute
        .compare(CompareOp::Le, lhs.handle(), rhs.handle())
        .map(Ebool::from_handle)
}

pub fn ge_u32<C: ConfidentialCompute + ?Sized>(
    compute: &C,
    lhs: Euint32,
    rhs: Euint32,
) -> Result<Ebool, ComputeError> {
    compute
        .compare(CompareOp::Ge, lhs.handle(), rhs.handle())
        .map(Ebool::from_handle)
}

pub fn eq_u32<C: ConfidentialCompute + ?Sized>(
    compute: &C,
    lhs: Euint32,
    rhs: Euint32,
) -> Result<Ebool, ComputeError> {
    compute
        .compare(CompareOp::Eq, lhs.handle(), rhs.handle())
        .map(Ebool::from_handle)
}

pub fn and_bool<C: ConfidentialCompute + ?Sized>(
    compute: &C,
    lhs: Ebool,
    rhs: Ebool,
) -> Result<Ebool, ComputeError> {
    compute
        .and(lhs.handle(), rhs.handle())
        .map(Ebool::from_handle)
}

// ===== User decryption =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ClearValue {
    Bool(bool),
    U32(u32),
    U256(U256),
}

impl ClearValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ClearValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ClearValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u256(&self) -> Option<U256> {
        match self {
            ClearValue::U256(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptionRequest {
    pub request_id: Uuid,
    pub handle: Handle,
    pub requester: Address,
    pub contract: Address,
}

impl DecryptionRequest {
    pub fn new(handle: Handle, requester: Address, contract: Address) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            handle,
            requester,
            contract,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("{requester} is not authorized to decrypt {handle}")]
    NotAuthorized { handle: Handle, requester: Address },

    #[error("Unknown ciphertext handle: {0}")]
    UnknownHandle(Handle),

    #[error("Decryption request timed out after {0}s")]
    Timeout(u64),

    #[error("Relayer error: {0}")]
    Relayer(String),
}

impl DecryptionError {
    /// Authorization failures are final; transport problems are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DecryptionError::Timeout(_) | DecryptionError::Relayer(_))
    }
}

#[async_trait]
pub trait UserDecryption: Send + Sync {
    async fn user_decrypt(&self, request: &DecryptionRequest) -> Result<ClearValue, DecryptionError>;
}
