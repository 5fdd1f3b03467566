use crate::credential::Credential;
use crate::crypto::content_id;
use crate::error::{CommitteeError, CommitteeResult};
use crate::tally::TallyPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

pub mod store;

pub use store::ResolutionStore;

/// Lifecycle of a resolution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    /// Accepting votes
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl ResolutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResolutionStatus::Pending)
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResolutionStatus::Pending => "pending",
            ResolutionStatus::Approved => "approved",
            ResolutionStatus::Rejected => "rejected",
            ResolutionStatus::Expired => "expired",
        };
        f.write_str(label)
    }
}

/// Why a vote could not be recorded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoteError {
    #[error("resolution is {0}, voting is closed")]
    VotingClosed(ResolutionStatus),

    #[error("{0} has already voted on this resolution")]
    AlreadyVoted(String),
}

impl From<VoteError> for CommitteeError {
    fn from(err: VoteError) -> Self {
        match err {
            VoteError::VotingClosed(_) => CommitteeError::State(err.to_string()),
            VoteError::AlreadyVoted(_) => CommitteeError::Conflict(err.to_string()),
        }
    }
}

/// A proposed credential and the votes cast on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Resolution {
    id: String,
    serialized_credential: String,
    status: ResolutionStatus,
    positive_votes: Vec<String>,
    negative_votes: Vec<String>,
}

impl Resolution {
    /// Create a pending resolution; the id is derived from the canonical credential bytes.
    pub fn new(credential: &Credential) -> CommitteeResult<Self> {
        let serialized_credential = credential.canonical_string()?;
        Ok(Self::from_serialized_credential(serialized_credential))
    }

    pub(crate) fn from_serialized_credential(serialized_credential: String) -> Self {
        Self {
            id: content_id(serialized_credential.as_bytes()),
            serialized_credential,
            status: ResolutionStatus::Pending,
            positive_votes: Vec::new(),
            negative_votes: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn serialized_credential(&self) -> &str {
        &self.serialized_credential
    }

    pub fn credential(&self) -> CommitteeResult<Credential> {
        Credential::from_canonical(&self.serialized_credential)
    }

    pub fn status(&self) -> ResolutionStatus {
        self.status
    }

    pub fn positive_votes(&self) -> &[String] {
        &self.positive_votes
    }

    pub fn negative_votes(&self) -> &[String] {
        &self.negative_votes
    }

    pub fn has_voted(&self, voter_id: &str) -> bool {
        self.positive_votes.iter().any(|v| v == voter_id)
            || self.negative_votes.iter().any(|v| v == voter_id)
    }

    fn check_votable(&self, voter_id: &str) -> Result<(), VoteError> {
        if self.status != ResolutionStatus::Pending {
            return Err(VoteError::VotingClosed(self.status));
        }
        if self.has_voted(voter_id) {
            return Err(VoteError::AlreadyVoted(voter_id.to_string()));
        }
        Ok(())
    }

    /// Record a positive vote. The status is only changed by [`Resolution::tally`].
    pub fn approve(&mut self, voter_id: &str) -> Result<(), VoteError> {
        self.check_votable(voter_id)?;
        self.positive_votes.push(voter_id.to_string());
        Ok(())
    }

    /// Record a negative vote.
    pub fn disapprove(&mut self, voter_id: &str) -> Result<(), VoteError> {
        self.check_votable(voter_id)?;
        self.negative_votes.push(voter_id.to_string());
        Ok(())
    }

    /// Ask the policy for a decision and apply it while the resolution is pending.
    /// Returns the (possibly unchanged) status.
    pub fn tally(&mut self, policy: &dyn TallyPolicy, members: &[String]) -> ResolutionStatus {
        if self.status == ResolutionStatus::Pending {
            self.status = policy.decide(members, &self.positive_votes, &self.negative_votes);
        }
        self.status
    }

    /// Structural checks applied to every resolution read back from storage
    pub(crate) fn validate(&self) -> Result<(), String> {
        if content_id(self.serialized_credential.as_bytes()) != self.id {
            return Err("identifier does not match credential content".to_string());
        }
        let mut seen = HashSet::new();
        for voter in self.positive_votes.iter().chain(self.negative_votes.iter()) {
            if !seen.insert(voter.as_str()) {
                return Err(format!("duplicate vote recorded for {}", voter));
            }
        }
        Ok(())
    }
}
