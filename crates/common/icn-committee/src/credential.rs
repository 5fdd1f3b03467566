use crate::did::{did_from_verifying_key, verifying_key_from_did};
use crate::error::{CommitteeError, CommitteeResult};
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signer, SigningKey, Verifier};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Claim key carrying a committee membership change
pub const MEMBERSHIP_CLAIM: &str = "committee_membership";

const CREDENTIALS_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
const RESOLUTION_CONTEXT: &str = "https://schema.intercooperative.network/2024/credentials/resolution/v1";

/// The claims a resolution proposes, as submitted by the proposer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Credential {
    /// Identity the claims are about
    pub subject: String,

    /// Claim name -> value; kept ordered so serialization is canonical
    pub claims: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl Credential {
    /// Validate an untyped request value against the credential schema
    pub fn from_value(value: Value) -> CommitteeResult<Self> {
        let credential: Credential = serde_json::from_value(value)
            .map_err(|e| CommitteeError::Validation(format!("invalid credential: {}", e)))?;
        if credential.subject.trim().is_empty() {
            return Err(CommitteeError::Validation(
                "invalid credential: subject must not be empty".to_string(),
            ));
        }
        Ok(credential)
    }

    /// Compact JSON with sorted keys; identical content always yields identical bytes.
    pub fn canonical_string(&self) -> CommitteeResult<String> {
        let value = serde_json::to_value(self)
            .map_err(|e| CommitteeError::Validation(format!("unable to serialize credential: {}", e)))?;
        Ok(canonicalize(&value).to_string())
    }

    pub fn from_canonical(serialized: &str) -> CommitteeResult<Self> {
        serde_json::from_str(serialized)
            .map_err(|e| CommitteeError::Validation(format!("unable to deserialize credential: {}", e)))
    }

    /// The membership change this credential proposes, if it carries one
    pub fn membership_change(&self) -> CommitteeResult<Option<MembershipChange>> {
        match self.claims.get(MEMBERSHIP_CLAIM) {
            None => Ok(None),
            Some(claim) => {
                let change: MembershipChange = serde_json::from_value(claim.clone()).map_err(|e| {
                    CommitteeError::Validation(format!("malformed {} claim: {}", MEMBERSHIP_CLAIM, e))
                })?;
                if change.member().trim().is_empty() {
                    return Err(CommitteeError::Validation(format!(
                        "malformed {} claim: member must not be empty",
                        MEMBERSHIP_CLAIM
                    )));
                }
                Ok(Some(change))
            }
        }
    }
}

/// Rebuild a JSON value with every object's keys in sorted order
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> = map.iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// A change to committee membership encoded in a resolution's claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum MembershipChange {
    Add { member: String },
    Remove { member: String },
}

impl MembershipChange {
    pub fn member(&self) -> &str {
        match self {
            MembershipChange::Add { member } | MembershipChange::Remove { member } => member,
        }
    }
}

/// Errors related to issued credential proofs
#[derive(Error, Debug)]
pub enum ProofError {
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("Proof validation failed: {0}")]
    ProofValidation(String),
}

/// Represents the cryptographic proof attached to a VC.
/// Based on Ed25519Signature2020 (simplified).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Proof {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(rename = "created")]
    pub created: DateTime<Utc>,
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,
    #[serde(rename = "proofPurpose")]
    pub proof_purpose: String,
    #[serde(rename = "proofValue")]
    pub proof_value: String,
}

/// Subject of an issued resolution credential
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResolutionSubject {
    pub id: String,
    pub resolution_identifier: String,
    pub claims: BTreeMap<String, Value>,
}

/// Verifiable credential attesting that the committee approved a resolution.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// Identifier of the issuing contract
    pub issuer: String,
    #[serde(rename = "issuanceDate")]
    pub issuance_date: DateTime<Utc>,
    #[serde(rename = "credentialSubject")]
    pub credential_subject: ResolutionSubject,
    pub proof: Option<Proof>,
}

impl VerifiableCredential {
    fn signing_input(&self) -> Result<Vec<u8>, ProofError> {
        let mut unsigned = self.clone();
        unsigned.proof = None;
        Ok(serde_json::to_vec(&unsigned)?)
    }

    /// Verify the credential's proof against the key named by its verification method
    pub fn verify(&self) -> Result<(), ProofError> {
        let proof = self
            .proof
            .as_ref()
            .ok_or_else(|| ProofError::MissingField("proof".to_string()))?;

        let verifying_key = verifying_key_from_did(&proof.verification_method)
            .map_err(|e| ProofError::Signature(e.to_string()))?;
        let signature = crate::crypto::decode_signature(&proof.proof_value)
            .map_err(|e| ProofError::Signature(e.to_string()))?;

        verifying_key
            .verify(&self.signing_input()?, &signature)
            .map_err(|e| ProofError::ProofValidation(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ProofError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ProofError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Mints signed credentials for approved resolutions.
pub struct CredentialIssuer {
    signing_key: SigningKey,
    verification_method: String,
}

impl CredentialIssuer {
    pub fn new(signing_key: SigningKey) -> Self {
        let verification_method = did_from_verifying_key(&signing_key.verifying_key());
        Self {
            signing_key,
            verification_method,
        }
    }

    /// Fresh issuer key, for tests and throwaway deployments
    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut rand::rngs::OsRng))
    }

    /// `did:key` identifier of the issuing key
    pub fn verification_method(&self) -> &str {
        &self.verification_method
    }

    /// Build and sign a credential binding the resolution, the contract and the claims.
    pub fn issue(
        &self,
        resolution_id: &str,
        contract_id: &str,
        credential: Credential,
    ) -> Result<VerifiableCredential, ProofError> {
        let now = Utc::now();

        let mut vc = VerifiableCredential {
            context: vec![CREDENTIALS_CONTEXT.to_string(), RESOLUTION_CONTEXT.to_string()],
            id: format!("urn:resolution:{}", resolution_id),
            types: vec![
                "VerifiableCredential".to_string(),
                "CommitteeResolutionCredential".to_string(),
            ],
            issuer: contract_id.to_string(),
            issuance_date: now,
            credential_subject: ResolutionSubject {
                id: credential.subject,
                resolution_identifier: resolution_id.to_string(),
                claims: credential.claims,
            },
            proof: None,
        };

        let signature = self.signing_key.sign(&vc.signing_input()?);
        vc.proof = Some(Proof {
            type_: "Ed25519Signature2020".to_string(),
            created: now,
            verification_method: self.verification_method.clone(),
            proof_purpose: "assertionMethod".to_string(),
            proof_value: crate::crypto::encode_base64(&signature.to_bytes()),
        });

        Ok(vc)
    }
}
