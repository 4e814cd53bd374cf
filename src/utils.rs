// src/utils.rs
//! Plaintext encodings for contact details before they are encrypted.

use alloy_primitives::U256;
use thiserror::Error;

/// Longest email that still fits in one `euint256`.
pub const MAX_EMAIL_BYTES: usize = 32;
pub const MIN_PHONE_DIGITS: usize = 7;
const PHONE_DIGITS_KEPT: usize = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactEncodingError {
    #[error("Email is empty")]
    EmptyEmail,

    #[error("Email is {0} bytes, at most {MAX_EMAIL_BYTES} fit in a ciphertext")]
    EmailTooLong(usize),

    #[error("Phone number needs at least {MIN_PHONE_DIGITS} digits, got {0}")]
    PhoneTooShort(usize),

    #[error("Phone number does not fit in 32 bits: {0}")]
    PhoneOutOfRange(String),
}

/// Pack an email into a 256-bit integer, big-endian, one byte per character.
pub fn encode_email(email: &str) -> Result<U256, ContactEncodingError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ContactEncodingError::EmptyEmail);
    }
    let bytes = email.as_bytes();
    if bytes.len() > MAX_EMAIL_BYTES {
        return Err(ContactEncodingError::EmailTooLong(bytes.len()));
    }
    U256::try_from_be_slice(bytes).ok_or(ContactEncodingError::EmailTooLong(bytes.len()))
}

pub fn decode_email(value: U256) -> String {
    let bytes: [u8; 32] = value.to_be_bytes();
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[start..]).into_owned()
}

/// Keep the digits of a phone number and pack the last ten of them into a `u32`.
pub fn encode_phone(phone: &str) -> Result<u32, ContactEncodingError> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < MIN_PHONE_DIGITS {
        return Err(ContactEncodingError::PhoneTooShort(digits.len()));
    }

    let tail = &digits[digits.len().saturating_sub(PHONE_DIGITS_KEPT)..];
    match tail.parse::<u64>() {
        Ok(n) if n >= 1 && n <= u64::from(u32::MAX) => Ok(n as u32),
        _ => Err(ContactEncodingError::PhoneOutOfRange(tail.to_string())),
    }
}
