use ed25519_dalek::{VerifyingKey, PUBLIC_KEY_LENGTH};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DidKeyError {
    #[error("Invalid key bytes: {0}")]
    InvalidKey(#[from] ed25519_dalek::SignatureError),
    #[error("Invalid key bytes length: expected {expected}, got {got}")]
    InvalidKeyBytesLength { expected: usize, got: usize },
    #[error("Invalid DID string: {0}")]
    InvalidDidString(String),
    #[error("Unsupported DID method: {0}")]
    UnsupportedDidMethod(String),
    #[error("Invalid multibase encoding: {0}")]
    InvalidMultibase(#[from] multibase::Error),
    #[error("Invalid multicodec prefix: expected 0xed01, got {0:?}")]
    InvalidMulticodecPrefix(Vec<u8>),
}

/// Multicodec prefix for Ed25519 public keys (0xed01)
const ED25519_MULTICODEC_PREFIX: &[u8] = &[0xed, 0x01];

/// Render an Ed25519 verifying key as a `did:key:z...` identifier.
pub fn did_from_verifying_key(key: &VerifyingKey) -> String {
    let mut bytes = Vec::with_capacity(ED25519_MULTICODEC_PREFIX.len() + PUBLIC_KEY_LENGTH);
    bytes.extend_from_slice(ED25519_MULTICODEC_PREFIX);
    bytes.extend_from_slice(key.as_bytes());
    format!("did:key:{}", multibase::encode(multibase::Base::Base58Btc, bytes))
}

/// Recover the verifying key from a `did:key` string, ignoring any `#fragment`.
pub fn verifying_key_from_did(did_str: &str) -> Result<VerifyingKey, DidKeyError> {
    let did = did_str.split('#').next().unwrap_or(did_str);
    let encoded_key = did
        .strip_prefix("did:key:")
        .ok_or_else(|| DidKeyError::UnsupportedDidMethod(did.to_string()))?;
    if !encoded_key.starts_with('z') {
        return Err(DidKeyError::InvalidDidString(
            "Expected base58btc encoding (prefix 'z')".to_string(),
        ));
    }

    let (_, decoded_bytes) = multibase::decode(encoded_key)?;
    if !decoded_bytes.starts_with(ED25519_MULTICODEC_PREFIX) {
        return Err(DidKeyError::InvalidMulticodecPrefix(
            decoded_bytes.iter().take(2).copied().collect(),
        ));
    }

    let key_bytes = &decoded_bytes[ED25519_MULTICODEC_PREFIX.len()..];
    let key_array: [u8; PUBLIC_KEY_LENGTH] =
        key_bytes
            .try_into()
            .map_err(|_| DidKeyError::InvalidKeyBytesLength {
                expected: PUBLIC_KEY_LENGTH,
                got: key_bytes.len(),
            })?;
    Ok(VerifyingKey::from_bytes(&key_array)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    #[test]
    fn test_did_string_conversion() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let did = did_from_verifying_key(&signing_key.verifying_key());
        assert!(did.starts_with("did:key:z"));

        let recovered = verifying_key_from_did(&did).expect("Failed to recover key from DID");
        assert_eq!(recovered, signing_key.verifying_key());

        let with_fragment = format!("{}#issuer", did);
        assert_eq!(verifying_key_from_did(&with_fragment).unwrap(), recovered);
    }

    #[test]
    fn test_invalid_did_parsing() {
        assert!(verifying_key_from_did("did:example:123").is_err());
        assert!(verifying_key_from_did("did:key:abc").is_err());
        let wrong_codec = multibase::encode(multibase::Base::Base58Btc, [0x01, 0x02, 0x03]);
        assert!(matches!(
            verifying_key_from_did(&format!("did:key:{}", wrong_codec)),
            Err(DidKeyError::InvalidMulticodecPrefix(_))
        ));
    }
}
