// src/fhe/mock.rs
//! In-process coprocessor for local development and tests.
//!
//! Plaintexts live in a private table keyed by handle, which is the same shape the
//! hardhat fhevm mock uses. Nothing outside this module can read that table except
//! through [`UserDecryption`], which enforces the ACL.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::{
    Attestation, CipherKind, ClearValue, CompareOp, ComputeError, ConfidentialCompute,
    DecryptionError, DecryptionRequest, Handle, InputOrigin, UserDecryption,
};

const HANDLE_DOMAIN: &[u8] = b"fhe-junction/handle/v1";
const ATTESTATION_DOMAIN: &[u8] = b"fhe-junction/attestation/v1";

#[derive(Debug, Clone, Copy)]
struct Ciphertext {
    kind: CipherKind,
    value: U256,
}

#[derive(Debug, Clone)]
struct AttestedBatch {
    origin: InputOrigin,
    entries: Vec<(Handle, CipherKind)>,
}

#[derive(Default)]
struct MockState {
    ciphertexts: HashMap<Handle, Ciphertext>,
    acl: HashSet<(Handle, Address)>,
    conditional: HashMap<(Handle, Address), Vec<Handle>>,
    attestations: HashMap<B256, AttestedBatch>,
    nonce: u64,
}

impl MockState {
    fn mint(&mut self, kind: CipherKind, value: U256) -> Handle {
        self.nonce += 1;
        let mut hasher = Sha256::new();
        hasher.update(HANDLE_DOMAIN);
        hasher.update(self.nonce.to_be_bytes());
        hasher.update([kind.tag()]);
        let handle = Handle(B256::from_slice(&hasher.finalize()));
        self.ciphertexts.insert(handle, Ciphertext { kind, value });
        handle
    }

    fn get(&self, handle: Handle) -> Result<Ciphertext, ComputeError> {
        self.ciphertexts
            .get(&handle)
            .copied()
            .ok_or(ComputeError::UnknownHandle(handle))
    }

    fn get_kind(&self, handle: Handle, kind: CipherKind) -> Result<U256, ComputeError> {
        let ct = self.get(handle)?;
        if ct.kind != kind {
            return Err(ComputeError::KindMismatch {
                expected: kind,
                found: ct.kind,
            });
        }
        Ok(ct.value)
    }

    fn is_truthy(&self, cond: Handle) -> bool {
        self.ciphertexts
            .get(&cond)
            .map(|ct| ct.kind == CipherKind::Bool && !ct.value.is_zero())
            .unwrap_or(false)
    }
}

fn bool_value(v: bool) -> U256 {
    U256::from(u64::from(v))
}

#[derive(Default)]
pub struct MockCoprocessor {
    state: Mutex<MockState>,
}

impl MockCoprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start building an attested input batch, the equivalent of
    /// `fhevm.createEncryptedInput(contract, sender)`.
    pub fn encrypted_input(&self, contract: Address, sender: Address) -> InputBuilder<'_> {
        InputBuilder {
            coprocessor: self,
            origin: InputOrigin { contract, sender },
            entries: Vec::new(),
        }
    }

    /// Synchronous form of [`UserDecryption::user_decrypt`].
    pub fn decrypt_for(&self, handle: Handle, requester: Address) -> Result<ClearValue, DecryptionError> {
        let state = self.state();
        let ct = state
            .ciphertexts
            .get(&handle)
            .copied()
            .ok_or(DecryptionError::UnknownHandle(handle))?;

        let unconditional = state.acl.contains(&(handle, requester));
        let conditional = state
            .conditional
            .get(&(handle, requester))
            .map(|conds| conds.iter().any(|c| state.is_truthy(*c)))
            .unwrap_or(false);

        if !unconditional && !conditional {
            return Err(DecryptionError::NotAuthorized { handle, requester });
        }

        Ok(match ct.kind {
            CipherKind::Bool => ClearValue::Bool(!ct.value.is_zero()),
            // Only u32-range values are ever minted with this kind.
            CipherKind::U32 => ClearValue::U32(ct.value.as_limbs()[0] as u32),
            CipherKind::U256 => ClearValue::U256(ct.value),
        })
    }

    fn register_batch(&self, origin: InputOrigin, values: Vec<(CipherKind, U256)>) -> EncryptedInput {
        let mut state = self.state();
        let entries: Vec<(Handle, CipherKind)> = values
            .into_iter()
            .map(|(kind, value)| (state.mint(kind, value), kind))
            .collect();

        let mut hasher = Sha256::new();
        hasher.update(ATTESTATION_DOMAIN);
        hasher.update(origin.contract.as_slice());
        hasher.update(origin.sender.as_slice());
        for (handle, kind) in &entries {
            hasher.update(handle.as_bytes());
            hasher.update([kind.tag()]);
        }
        let digest = B256::from_slice(&hasher.finalize());

        let handles = entries.iter().map(|(h, _)| *h).collect();
        state.attestations.insert(digest, AttestedBatch { origin, entries });

        EncryptedInput {
            handles,
            attestation: Attestation(digest),
        }
    }
}

/// Handles plus the attestation covering all of them.
#[derive(Debug, Clone)]
pub struct EncryptedInput {
    pub handles: Vec<Handle>,
    pub attestation: Attestation,
}

pub struct InputBuilder<'a> {
    coprocessor: &'a MockCoprocessor,
    origin: InputOrigin,
    entries: Vec<(CipherKind, U256)>,
}

impl<'a> InputBuilder<'a> {
    pub fn add_bool(mut self, value: bool) -> Self {
        self.entries.push((CipherKind::Bool, bool_value(value)));
        self
    }

    pub fn add32(mut self, value: u32) -> Self {
        self.entries.push((CipherKind::U32, U256::from(value)));
        self
    }

    pub fn add256(mut self, value: U256) -> Self {
        self.entries.push((CipherKind::U256, value));
        self
    }

    pub fn encrypt(self) -> EncryptedInput {
        self.coprocessor.register_batch(self.origin, self.entries)
    }
}

impl ConfidentialCompute for MockCoprocessor {
    fn verify_input(
        &self,
        ext: Handle,
        kind: CipherKind,
        attestation: &Attestation,
        origin: InputOrigin,
    ) -> Result<Handle, ComputeError> {
        let state = self.state();
        let batch = state
            .attestations
            .get(&attestation.0)
            .ok_or(ComputeError::InvalidAttestation)?;

        if batch.origin.contract != origin.contract {
            return Err(ComputeError::AttestationMismatch {
                expected: batch.origin.contract,
                actual: origin.contract,
            });
        }
        if batch.origin.sender != origin.sender {
            return Err(ComputeError::AttestationMismatch {
                expected: batch.origin.sender,
                actual: origin.sender,
            });
        }

        let (_, attested_kind) = batch
            .entries
            .iter()
            .find(|(h, _)| *h == ext)
            .ok_or(ComputeError::HandleNotAttested(ext))?;

        if *attested_kind != kind {
            return Err(ComputeError::KindMismatch {
                expected: kind,
                found: *attested_kind,
            });
        }

        Ok(ext)
    }

    fn compare(&self, op: CompareOp, lhs: Handle, rhs: Handle) -> Result<Handle, ComputeError> {
        let mut state = self.state();
        let a = state.get(lhs)?;
        let b = state.get_kind(rhs, a.kind)?;
        let result = match op {
            CompareOp::Le => a.value <= b,
            CompareOp::Ge => a.value >= b,
            CompareOp::Eq => a.value == b,
        };
        Ok(state.mint(CipherKind::Bool, bool_value(result)))
    }

    fn and(&self, lhs: Handle, rhs: Handle) -> Result<Handle, ComputeError> {
        let mut state = self.state();
        let a = state.get_kind(lhs, CipherKind::Bool)?;
        let b = state.get_kind(rhs, CipherKind::Bool)?;
        Ok(state.mint(CipherKind::Bool, bool_value(!a.is_zero() && !b.is_zero())))
    }

    fn select(&self, cond: Handle, if_true: Handle, if_false: Handle) -> Result<Handle, ComputeError> {
        let mut state = self.state();
        let c = state.get_kind(cond, CipherKind::Bool)?;
        let t = state.get(if_true)?;
        let f = state.get_kind(if_false, t.kind)?;
        let value = if c.is_zero() { f } else { t.value };
        Ok(state.mint(t.kind, value))
    }

    fn allow(&self, handle: Handle, party: Address) {
        debug!("ACL grant {} -> {}", handle, party);
        self.state().acl.insert((handle, party));
    }

    fn allow_if(&self, cond: Handle, handle: Handle, party: Address) {
        debug!("Conditional ACL grant {} -> {}", handle, party);
        self.state()
            .conditional
            .entry((handle, party))
            .or_default()
            .push(cond);
    }

    fn is_allowed(&self, handle: Handle, party: Address) -> bool {
        self.state().acl.contains(&(handle, party))
    }
}

#[async_trait]
impl UserDecryption for MockCoprocessor {
    async fn user_decrypt(&self, request: &DecryptionRequest) -> Result<ClearValue, DecryptionError> {
        self.decrypt_for(request.handle, request.requester)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_verify_input_binds_sender_and_contract() {
        let mock = MockCoprocessor::new();
        let input = mock.encrypted_input(addr(1), addr(2)).add32(7).encrypt();
        let handle = input.handles[0];

        let ok = mock.verify_input(
            handle,
            CipherKind::U32,
            &input.attestation,
            InputOrigin { contract: addr(1), sender: addr(2) },
        );
        assert_eq!(ok, Ok(handle));

        let wrong_sender = mock.verify_input(
            handle,
            CipherKind::U32,
            &input.attestation,
            InputOrigin { contract: addr(1), sender: addr(3) },
        );
        assert!(matches!(wrong_sender, Err(ComputeError::AttestationMismatch { .. })));

        let wrong_kind = mock.verify_input(
            handle,
            CipherKind::U256,
            &input.attestation,
            InputOrigin { contract: addr(1), sender: addr(2) },
        );
        assert!(matches!(wrong_kind, Err(ComputeError::KindMismatch { .. })));
    }

    #[test]
    fn test_unknown_attestation_rejected() {
        let mock = MockCoprocessor::new();
        let input = mock.encrypted_input(addr(1), addr(2)).add32(7).encrypt();
        let forged = Attestation(B256::repeat_byte(0x11));
        let result = mock.verify_input(
            input.handles[0],
            CipherKind::U32,
            &forged,
            InputOrigin { contract: addr(1), sender: addr(2) },
        );
        assert_eq!(result, Err(ComputeError::InvalidAttestation));
    }

    #[test]
    fn test_attestation_is_reusable_but_covers_only_its_batch() {
        let mock = MockCoprocessor::new();
        let origin = InputOrigin { contract: addr(1), sender: addr(2) };
        let input = mock.encrypted_input(addr(1), addr(2)).add32(7).encrypt();
        let other = mock.encrypted_input(addr(1), addr(2)).add32(7).encrypt();
        let handle = input.handles[0];

        for _ in 0..2 {
            let result = mock.verify_input(handle, CipherKind::U32, &input.attestation, origin);
            assert_eq!(result, Ok(handle));
        }

        let foreign = other.handles[0];
        let result = mock.verify_input(foreign, CipherKind::U32, &input.attestation, origin);
        assert_eq!(result, Err(ComputeError::HandleNotAttested(foreign)));
    }

    #[test]
    fn test_compare_and_select() {
        let mock = MockCoprocessor::new();
        let input = mock
            .encrypted_input(addr(1), addr(2))
            .add32(5)
            .add32(3)
            .add256(U256::from(42u64))
            .add256(U256::ZERO)
            .encrypt();
        let [five, three, answer, zero] = [
            input.handles[0],
            input.handles[1],
            input.handles[2],
            input.handles[3],
        ];

        let ge = mock.compare(CompareOp::Ge, five, three).unwrap();
        let le = mock.compare(CompareOp::Le, five, three).unwrap();
        let both = mock.and(ge, le).unwrap();
        let picked = mock.select(ge, answer, zero).unwrap();

        for h in [ge, le, both, picked] {
            mock.allow(h, addr(9));
        }
        assert_eq!(mock.decrypt_for(ge, addr(9)), Ok(ClearValue::Bool(true)));
        assert_eq!(mock.decrypt_for(le, addr(9)), Ok(ClearValue::Bool(false)));
        assert_eq!(mock.decrypt_for(both, addr(9)), Ok(ClearValue::Bool(false)));
        assert_eq!(
            mock.decrypt_for(picked, addr(9)),
            Ok(ClearValue::U256(U256::from(42u64)))
        );
    }

    #[test]
    fn test_compare_rejects_mixed_kinds() {
        let mock = MockCoprocessor::new();
        let input = mock
            .encrypted_input(addr(1), addr(2))
            .add32(5)
            .add256(U256::from(5u64))
            .encrypt();
        let result = mock.compare(CompareOp::Eq, input.handles[0], input.handles[1]);
        assert!(matches!(result, Err(ComputeError::KindMismatch { .. })));
    }

    #[test]
    fn test_conditional_grant_follows_encrypted_predicate() {
        let mock = MockCoprocessor::new();
        let input = mock
            .encrypted_input(addr(1), addr(2))
            .add_bool(true)
            .add_bool(false)
            .add32(1234567)
            .add32(7654321)
            .encrypt();
        let (yes, no, phone_a, phone_b) =
            (input.handles[0], input.handles[1], input.handles[2], input.handles[3]);

        mock.allow_if(yes, phone_a, addr(5));
        mock.allow_if(no, phone_b, addr(5));

        assert_eq!(mock.decrypt_for(phone_a, addr(5)), Ok(ClearValue::U32(1234567)));
        assert!(matches!(
            mock.decrypt_for(phone_b, addr(5)),
            Err(DecryptionError::NotAuthorized { .. })
        ));
        // Conditional grants never show up in the public ACL view.
        assert!(!mock.is_allowed(phone_a, addr(5)));
    }
}
