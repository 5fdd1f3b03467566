//! Pure helpers over the hashing, encoding and signature primitives.

use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid verifying key: {0}")]
    InvalidKey(String),

    #[error("failed to decode signature: {0}")]
    SignatureDecode(String),

    #[error("invalid signature length: expected {expected}, got {got}")]
    InvalidSignatureLength { expected: usize, got: usize },

    #[error("signature verification failed")]
    VerificationFailed,
}

/// Content-addressed identifier: base64 of the SHA-256 digest of `bytes`.
pub fn content_id(bytes: &[u8]) -> String {
    BASE64_ENGINE.encode(Sha256::digest(bytes))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64_ENGINE.encode(bytes)
}

pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64_ENGINE.decode(encoded.trim())
}

/// Parse a base64 encoded Ed25519 verifying key
pub fn decode_verifying_key(encoded: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = decode_base64(encoded).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let key_bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidKey(format!(
            "expected {} bytes, got {}",
            PUBLIC_KEY_LENGTH,
            bytes.len()
        ))
    })?;
    VerifyingKey::from_bytes(&key_bytes).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Decode a base64 signature into its fixed-size form
pub fn decode_signature(encoded: &str) -> Result<Signature, CryptoError> {
    let sig_bytes = decode_base64(encoded).map_err(|e| CryptoError::SignatureDecode(e.to_string()))?;
    if sig_bytes.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignatureLength {
            expected: SIGNATURE_LENGTH,
            got: sig_bytes.len(),
        });
    }
    let mut sig_array = [0u8; SIGNATURE_LENGTH];
    sig_array.copy_from_slice(&sig_bytes);
    Ok(Signature::from_bytes(&sig_array))
}

pub fn verify_signature(key: &VerifyingKey, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
    key.verify(message, signature)
        .map_err(|_| CryptoError::VerificationFailed)
}
