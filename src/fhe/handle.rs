// src/fhe/handle.rs
//! Opaque ciphertext handles and their typed wrappers.
//!
//! A handle is a 32-byte reference to a ciphertext held by the coprocessor. The typed
//! wrappers carry the declared plaintext range but deliberately expose no arithmetic or
//! ordering: every operation on the underlying value goes through
//! [`ConfidentialCompute`](super::ConfidentialCompute).

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared plaintext range of a ciphertext, bound by the input attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherKind {
    Bool,
    U32,
    U256,
}

impl CipherKind {
    pub fn tag(self) -> u8 {
        match self {
            CipherKind::Bool => 0,
            CipherKind::U32 => 4,
            CipherKind::U256 => 8,
        }
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherKind::Bool => write!(f, "ebool"),
            CipherKind::U32 => write!(f, "euint32"),
            CipherKind::U256 => write!(f, "euint256"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub B256);

impl Handle {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }
}

impl From<B256> for Handle {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Attestation accompanying a batch of externally encrypted inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attestation(pub B256);

macro_rules! encrypted_scalar {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Handle);

        impl $name {
            /// Only the compute layer mints typed values; see `fhe::verify_*`.
            pub(crate) fn from_handle(handle: Handle) -> Self {
                Self(handle)
            }

            pub fn handle(&self) -> Handle {
                self.0
            }
        }
    };
}

encrypted_scalar!(
    /// Encrypted 32-bit unsigned integer.
    Euint32
);
encrypted_scalar!(
    /// Encrypted 256-bit unsigned integer (used for the packed contact email).
    Euint256
);
encrypted_scalar!(
    /// Encrypted boolean, produced by comparisons.
    Ebool
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_distinct() {
        let tags = [CipherKind::Bool, CipherKind::U32, CipherKind::U256].map(CipherKind::tag);
        assert_ne!(tags[0], tags[1]);
        assert_ne!(tags[1], tags[2]);
        assert_ne!(tags[0], tags[2]);
    }

    #[test]
    fn test_handle_serializes_as_hex() {
        let handle = Handle(B256::repeat_byte(0xab));
        let json = serde_json::to_string(&handle).unwrap();
        assert!(json.starts_with("\"0xabab"));
        let back: Handle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }
}
