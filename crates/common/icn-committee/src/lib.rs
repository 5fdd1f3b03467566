//! Committee governance for ICN: members vote on proposed credentials
//! ("resolutions"), and an approved resolution is issued as a verifiable
//! credential once the ledger has witnessed the approving state.

pub mod committee;
pub mod context;
pub mod contract;
pub mod credential;
pub mod crypto;
pub mod did;
pub mod error;
pub mod ledger;
pub mod message;
pub mod resolution;
pub mod storage;
pub mod tally;

pub use committee::Committee;
pub use context::InvocationContext;
pub use contract::CommitteeContract;
pub use credential::{Credential, CredentialIssuer, MembershipChange, VerifiableCredential};
pub use error::{CommitteeError, CommitteeResult, ErrorKind};
pub use ledger::{commitment_payload, LedgerVerifier};
pub use message::*;
pub use resolution::{Resolution, ResolutionStatus, ResolutionStore};
pub use storage::{FileBackend, MemoryBackend, StateStore, StorageBackend};
pub use tally::{MajorityPolicy, TallyPolicy, TallyRule, ThresholdPolicy, UnanimousPolicy};
