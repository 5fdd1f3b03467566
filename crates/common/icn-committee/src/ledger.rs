//! Proof that a contract state snapshot was anchored on the external ledger.
//!
//! The ledger signs `contract_id || state_hash` with its Ed25519 key. A valid
//! signature over the pre-call state hash shows the state the caller acts on
//! has been witnessed outside the contract.

use crate::crypto::{decode_signature, decode_verifying_key, verify_signature, CryptoError};
use crate::error::{CommitteeError, CommitteeResult};
use crate::storage::KeyValueStore;
use ed25519_dalek::VerifyingKey;
use tracing::{debug, info, warn};

/// Key of the registered ledger verifying key
pub const LEDGER_KEY: &str = "ledger_verifying_key";

/// Bytes the ledger signs: contract identifier first, then the state hash.
pub fn commitment_payload(contract_id: &str, state_hash: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(contract_id.len() + state_hash.len());
    payload.extend_from_slice(contract_id.as_bytes());
    payload.extend_from_slice(state_hash);
    payload
}

pub struct LedgerVerifier<S> {
    store: S,
}

impl<S: KeyValueStore> LedgerVerifier<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register the ledger key. It can only be set once.
    pub fn register(&self, encoded_key: &str) -> CommitteeResult<()> {
        if self.store.get(LEDGER_KEY)?.is_some() {
            return Err(CommitteeError::State("ledger key is already registered".to_string()));
        }
        decode_verifying_key(encoded_key)
            .map_err(|e| CommitteeError::Validation(format!("ledger_verifying_key: {}", e)))?;
        self.store.set_json(LEDGER_KEY, encoded_key.trim())?;
        info!("ledger verifying key registered");
        Ok(())
    }

    /// The registered key; `NotInitialized` when none was registered
    pub fn verifying_key(&self) -> CommitteeResult<VerifyingKey> {
        let encoded: String = self
            .store
            .get_json(LEDGER_KEY)?
            .ok_or(CommitteeError::NotInitialized)?;
        Ok(decode_verifying_key(&encoded)?)
    }

    /// Check a base64 ledger signature over `contract_id || state_hash`.
    pub fn verify_commitment(&self, contract_id: &str, state_hash: &[u8], signature: &str) -> CommitteeResult<()> {
        let key = self.verifying_key()?;
        let signature = decode_signature(signature).map_err(|e| {
            warn!(error = %e, "ledger signature could not be decoded");
            e
        })?;

        let payload = commitment_payload(contract_id, state_hash);
        match verify_signature(&key, &payload, &signature) {
            Ok(()) => {
                debug!(contract_id = %contract_id, "ledger commitment verified");
                Ok(())
            }
            Err(CryptoError::VerificationFailed) => {
                warn!(contract_id = %contract_id, "ledger signature does not match the committed state");
                Err(CryptoError::VerificationFailed.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
