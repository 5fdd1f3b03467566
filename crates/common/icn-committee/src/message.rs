//! Request and response bodies of the contract operations.
//!
//! Requests reject unknown fields and empty required strings before any
//! business logic runs.

use crate::credential::Credential;
use crate::error::{CommitteeError, CommitteeResult};
use crate::resolution::ResolutionStatus;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decode a JSON request body; schema mismatches are validation failures.
pub fn parse_request<T: DeserializeOwned>(body: &str) -> CommitteeResult<T> {
    serde_json::from_str(body).map_err(|e| CommitteeError::Validation(e.to_string()))
}

fn require_field(name: &str, value: &str) -> CommitteeResult<()> {
    if value.trim().is_empty() {
        return Err(CommitteeError::Validation(format!("{} must not be empty", name)));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InitializeCommitteeRequest {
    /// Base64 Ed25519 key of the ledger
    pub ledger_verifying_key: String,
    pub initial_members: Vec<String>,
}

impl InitializeCommitteeRequest {
    pub fn validate(&self) -> CommitteeResult<()> {
        require_field("ledger_verifying_key", &self.ledger_verifying_key)?;
        if self.initial_members.is_empty() {
            return Err(CommitteeError::Validation(
                "initial_members must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body of every operation addressed at a single resolution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResolutionRequest {
    pub resolution_identifier: String,
}

impl ResolutionRequest {
    pub fn new(resolution_identifier: impl Into<String>) -> Self {
        Self {
            resolution_identifier: resolution_identifier.into(),
        }
    }

    pub fn validate(&self) -> CommitteeResult<()> {
        require_field("resolution_identifier", &self.resolution_identifier)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProposeResolutionRequest {
    /// Untyped so that schema errors surface as validation failures with context
    pub credential: Value,
}

impl ProposeResolutionRequest {
    pub fn credential(&self) -> CommitteeResult<Credential> {
        Credential::from_value(self.credential.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IssueCredentialRequest {
    /// Base64 ledger signature over `contract_id || state_hash`
    pub ledger_signature: String,
    pub resolution_identifier: String,
}

impl IssueCredentialRequest {
    pub fn validate(&self) -> CommitteeResult<()> {
        require_field("ledger_signature", &self.ledger_signature)?;
        require_field("resolution_identifier", &self.resolution_identifier)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProposeResolutionResponse {
    pub resolution_identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteResponse {
    pub resolution_identifier: String,
    /// Status after the tally that followed the vote
    pub status: ResolutionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResolutionsResponse {
    pub resolution_identifiers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolutionStatusResponse {
    pub resolution_identifier: String,
    pub status: ResolutionStatus,
    pub credential: Credential,
    pub positive_votes: Vec<String>,
    pub negative_votes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipResponse {
    pub members: Vec<String>,
}
