use crate::committee::Committee;
use crate::context::InvocationContext;
use crate::crypto::CryptoError;
use crate::credential::{CredentialIssuer, MembershipChange, VerifiableCredential, MEMBERSHIP_CLAIM};
use crate::error::{CommitteeError, CommitteeResult};
use crate::ledger::LedgerVerifier;
use crate::message::{
    InitializeCommitteeRequest, IssueCredentialRequest, ListResolutionsResponse, MembershipResponse,
    ProposeResolutionRequest, ProposeResolutionResponse, ResolutionRequest, ResolutionStatusResponse,
    VoteResponse,
};
use crate::resolution::{Resolution, ResolutionStatus, ResolutionStore};
use crate::storage::{KeyValueStore, StateStore, StorageBackend, Transaction};
use crate::tally::{MajorityPolicy, TallyPolicy};
use tracing::{info, warn};

pub const COMMITTEE_NAMESPACE: &str = "committee_store";
pub const RESOLUTION_NAMESPACE: &str = "resolution_store";
pub const CONTRACT_NAMESPACE: &str = "contract_store";

const OWNER_KEY: &str = "owner";
const APPLIED_MEMBERSHIP_KEY: &str = "applied_membership_resolutions";

/// Owner value once the committee runs on its own
pub const UNASSIGNED_OWNER: &str = "__UNASSIGNED__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vote {
    Approve,
    Disapprove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MembershipAction {
    Add,
    Remove,
}

/// The committee governance contract.
///
/// Every operation runs inside one [`Transaction`]: it either commits all of its
/// writes or leaves the persisted state untouched.
pub struct CommitteeContract<B> {
    state: StateStore<B>,
    policy: Box<dyn TallyPolicy>,
    issuer: CredentialIssuer,
}

impl<B: StorageBackend> CommitteeContract<B> {
    pub fn new(state: StateStore<B>, policy: Box<dyn TallyPolicy>, issuer: CredentialIssuer) -> Self {
        Self { state, policy, issuer }
    }

    /// Majority tally and a freshly generated issuer key
    pub fn with_defaults(backend: B) -> Self {
        Self::new(StateStore::new(backend), Box::new(MajorityPolicy), CredentialIssuer::generate())
    }

    pub fn state(&self) -> &StateStore<B> {
        &self.state
    }

    pub fn policy(&self) -> &dyn TallyPolicy {
        self.policy.as_ref()
    }

    pub fn issuer(&self) -> &CredentialIssuer {
        &self.issuer
    }

    /// Hash of the committed state, as signed by the ledger
    pub fn state_hash(&self) -> CommitteeResult<[u8; 32]> {
        Ok(self.state.state_hash()?)
    }

    fn transact<T>(&self, op: impl FnOnce(&Transaction<'_, B>) -> CommitteeResult<T>) -> CommitteeResult<T> {
        let txn = self.state.begin()?;
        let value = op(&txn)?;
        txn.commit()?;
        Ok(value)
    }

    /// Record the caller as owner and prepare the resolution index.
    pub fn initialize_contract(&self, ctx: &InvocationContext) -> CommitteeResult<()> {
        self.transact(|txn| {
            let contract = txn.namespace(CONTRACT_NAMESPACE);
            if contract.get(OWNER_KEY)?.is_some() {
                return Err(CommitteeError::State("contract is already initialized".to_string()));
            }
            contract.set_json(OWNER_KEY, &ctx.originator_id)?;
            ResolutionStore::new(txn.namespace(RESOLUTION_NAMESPACE)).initialize()?;
            info!(owner = %ctx.originator_id, contract_id = %ctx.contract_id, "contract initialized");
            Ok(())
        })
    }

    /// Register the ledger key and founding members, then hand control to the committee.
    pub fn initialize_committee(
        &self,
        ctx: &InvocationContext,
        request: &InitializeCommitteeRequest,
    ) -> CommitteeResult<()> {
        request.validate()?;
        self.transact(|txn| {
            let contract = txn.namespace(CONTRACT_NAMESPACE);
            let owner: String = contract.get_json(OWNER_KEY)?.ok_or(CommitteeError::NotInitialized)?;
            if owner == UNASSIGNED_OWNER {
                return Err(CommitteeError::Authorization(
                    "committee is already initialized".to_string(),
                ));
            }
            if owner != ctx.originator_id {
                return Err(CommitteeError::Authorization(format!(
                    "{} is not the contract owner",
                    ctx.originator_id
                )));
            }

            LedgerVerifier::new(&contract).register(&request.ledger_verifying_key)?;
            Committee::initialize(txn.namespace(COMMITTEE_NAMESPACE), request.initial_members.clone())?;
            contract.set_json(OWNER_KEY, UNASSIGNED_OWNER)?;
            contract.set_json(APPLIED_MEMBERSHIP_KEY, &Vec::<String>::new())?;

            info!(members = request.initial_members.len(), "committee initialized, ownership relinquished");
            Ok(())
        })
    }

    pub fn propose_resolution(
        &self,
        ctx: &InvocationContext,
        request: &ProposeResolutionRequest,
    ) -> CommitteeResult<ProposeResolutionResponse> {
        let credential = request.credential()?;
        let resolution = Resolution::new(&credential)?;
        self.transact(|txn| {
            require_committee(txn)?;
            ResolutionStore::new(txn.namespace(RESOLUTION_NAMESPACE)).add_resolution(&resolution)?;
            info!(resolution_id = %resolution.id(), proposer = %ctx.originator_id, "resolution proposed");
            Ok(ProposeResolutionResponse {
                resolution_identifier: resolution.id().to_string(),
            })
        })
    }

    pub fn approve_resolution(
        &self,
        ctx: &InvocationContext,
        request: &ResolutionRequest,
    ) -> CommitteeResult<VoteResponse> {
        self.vote(ctx, request, Vote::Approve)
    }

    pub fn disapprove_resolution(
        &self,
        ctx: &InvocationContext,
        request: &ResolutionRequest,
    ) -> CommitteeResult<VoteResponse> {
        self.vote(ctx, request, Vote::Disapprove)
    }

    fn vote(&self, ctx: &InvocationContext, request: &ResolutionRequest, vote: Vote) -> CommitteeResult<VoteResponse> {
        request.validate()?;
        self.transact(|txn| {
            require_committee(txn)?;
            let committee = Committee::load(txn.namespace(COMMITTEE_NAMESPACE))?;
            require_member(&committee, ctx)?;

            let store = ResolutionStore::new(txn.namespace(RESOLUTION_NAMESPACE));
            let mut resolution = store.get_resolution(&request.resolution_identifier)?;
            let recorded = match vote {
                Vote::Approve => resolution.approve(&ctx.originator_id),
                Vote::Disapprove => resolution.disapprove(&ctx.originator_id),
            };
            if let Err(e) = recorded {
                warn!(resolution_id = %resolution.id(), voter = %ctx.originator_id, error = %e, "vote rejected");
                return Err(e.into());
            }

            let status = resolution.tally(self.policy.as_ref(), committee.members());
            store.update_resolution(&resolution)?;
            if status != ResolutionStatus::Pending {
                info!(
                    resolution_id = %resolution.id(),
                    status = %status,
                    policy = %self.policy.describe(),
                    "resolution decided"
                );
            }
            Ok(VoteResponse {
                resolution_identifier: resolution.id().to_string(),
                status,
            })
        })
    }

    pub fn list_resolutions(&self, _ctx: &InvocationContext) -> CommitteeResult<ListResolutionsResponse> {
        self.transact(|txn| {
            require_committee(txn)?;
            let resolution_identifiers =
                ResolutionStore::new(txn.namespace(RESOLUTION_NAMESPACE)).list_resolutions()?;
            Ok(ListResolutionsResponse { resolution_identifiers })
        })
    }

    pub fn resolution_status(
        &self,
        _ctx: &InvocationContext,
        request: &ResolutionRequest,
    ) -> CommitteeResult<ResolutionStatusResponse> {
        request.validate()?;
        self.transact(|txn| {
            require_committee(txn)?;
            let resolution =
                ResolutionStore::new(txn.namespace(RESOLUTION_NAMESPACE)).get_resolution(&request.resolution_identifier)?;
            Ok(ResolutionStatusResponse {
                resolution_identifier: resolution.id().to_string(),
                status: resolution.status(),
                credential: resolution.credential()?,
                positive_votes: resolution.positive_votes().to_vec(),
                negative_votes: resolution.negative_votes().to_vec(),
            })
        })
    }

    /// Mint a credential for an approved resolution whose approval the ledger has witnessed.
    pub fn issue_resolution_credential(
        &self,
        ctx: &InvocationContext,
        request: &IssueCredentialRequest,
    ) -> CommitteeResult<VerifiableCredential> {
        request.validate()?;
        self.transact(|txn| {
            require_committee(txn)?;
            let committee = Committee::load(txn.namespace(COMMITTEE_NAMESPACE))?;
            require_member(&committee, ctx)?;

            // The attestation must cover the committed pre-call state
            let committed = txn.state_hash()?;
            if ctx.state_hash.as_slice() != committed.as_slice() {
                warn!(
                    contract_id = %ctx.contract_id,
                    presented = %hex::encode(&ctx.state_hash),
                    committed = %hex::encode(committed),
                    "invocation state hash does not match the committed state"
                );
                return Err(CryptoError::VerificationFailed.into());
            }
            LedgerVerifier::new(txn.namespace(CONTRACT_NAMESPACE)).verify_commitment(
                &ctx.contract_id,
                &committed,
                &request.ledger_signature,
            )?;

            let resolution =
                ResolutionStore::new(txn.namespace(RESOLUTION_NAMESPACE)).get_resolution(&request.resolution_identifier)?;
            if resolution.status() != ResolutionStatus::Approved {
                return Err(CommitteeError::State(format!(
                    "resolution {} is {}, only approved resolutions can be issued",
                    resolution.id(),
                    resolution.status()
                )));
            }

            let credential = resolution.credential()?;
            let vc = self.issuer.issue(resolution.id(), &ctx.contract_id, credential)?;
            info!(resolution_id = %resolution.id(), issuer = %ctx.contract_id, "credential issued");
            Ok(vc)
        })
    }

    /// Apply an approved `add` membership resolution.
    pub fn add_member(&self, ctx: &InvocationContext, request: &ResolutionRequest) -> CommitteeResult<MembershipResponse> {
        self.change_membership(ctx, request, MembershipAction::Add)
    }

    /// Apply an approved `remove` membership resolution.
    pub fn remove_member(
        &self,
        ctx: &InvocationContext,
        request: &ResolutionRequest,
    ) -> CommitteeResult<MembershipResponse> {
        self.change_membership(ctx, request, MembershipAction::Remove)
    }

    fn change_membership(
        &self,
        ctx: &InvocationContext,
        request: &ResolutionRequest,
        action: MembershipAction,
    ) -> CommitteeResult<MembershipResponse> {
        request.validate()?;
        self.transact(|txn| {
            require_committee(txn)?;
            let mut committee = Committee::load(txn.namespace(COMMITTEE_NAMESPACE))?;
            require_member(&committee, ctx)?;

            let resolution =
                ResolutionStore::new(txn.namespace(RESOLUTION_NAMESPACE)).get_resolution(&request.resolution_identifier)?;
            if resolution.status() != ResolutionStatus::Approved {
                return Err(CommitteeError::State(format!(
                    "resolution {} is {}, membership changes require an approved resolution",
                    resolution.id(),
                    resolution.status()
                )));
            }

            let change = resolution.credential()?.membership_change()?.ok_or_else(|| {
                CommitteeError::Validation(format!(
                    "resolution {} carries no {} claim",
                    resolution.id(),
                    MEMBERSHIP_CLAIM
                ))
            })?;

            let contract = txn.namespace(CONTRACT_NAMESPACE);
            let mut applied: Vec<String> = contract.get_json(APPLIED_MEMBERSHIP_KEY)?.unwrap_or_default();
            if applied.iter().any(|id| id == resolution.id()) {
                return Err(CommitteeError::Conflict(format!(
                    "membership resolution {} has already been applied",
                    resolution.id()
                )));
            }

            match (action, &change) {
                (MembershipAction::Add, MembershipChange::Add { member }) => committee.add_member(member)?,
                (MembershipAction::Remove, MembershipChange::Remove { member }) => committee.remove_member(member)?,
                _ => {
                    return Err(CommitteeError::Validation(format!(
                        "resolution {} does not propose this membership change",
                        resolution.id()
                    )))
                }
            }

            applied.push(resolution.id().to_string());
            contract.set_json(APPLIED_MEMBERSHIP_KEY, &applied)?;
            info!(
                resolution_id = %resolution.id(),
                member = %change.member(),
                applied_by = %ctx.originator_id,
                "membership resolution applied"
            );
            Ok(MembershipResponse {
                members: committee.members().to_vec(),
            })
        })
    }

    /// Current committee members
    pub fn members(&self, _ctx: &InvocationContext) -> CommitteeResult<Vec<String>> {
        self.transact(|txn| {
            require_committee(txn)?;
            Ok(Committee::load(txn.namespace(COMMITTEE_NAMESPACE))?.members().to_vec())
        })
    }
}

/// Every operation after initialization requires the owner to have handed over control.
fn require_committee<B: StorageBackend>(txn: &Transaction<'_, B>) -> CommitteeResult<()> {
    let owner: Option<String> = txn.namespace(CONTRACT_NAMESPACE).get_json(OWNER_KEY)?;
    match owner.as_deref() {
        Some(UNASSIGNED_OWNER) => Ok(()),
        _ => Err(CommitteeError::Authorization(
            "committee has not been initialized".to_string(),
        )),
    }
}

fn require_member<S: KeyValueStore>(committee: &Committee<S>, ctx: &InvocationContext) -> CommitteeResult<()> {
    if committee.is_member(&ctx.originator_id) {
        Ok(())
    } else {
        Err(CommitteeError::Authorization(format!(
            "{} is not a committee member",
            ctx.originator_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::CredentialIssuer;
    use crate::crypto::encode_base64;
    use crate::error::ErrorKind;
    use crate::ledger::commitment_payload;
    use crate::storage::MemoryBackend;
    use crate::tally::UnanimousPolicy;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;
    use serde_json::json;

    const CONTRACT: &str = "contract-1";

    fn ctx(who: &str) -> InvocationContext {
        InvocationContext::new(who, CONTRACT)
    }

    fn setup(policy: Box<dyn TallyPolicy>) -> (CommitteeContract<MemoryBackend>, SigningKey) {
        let contract = CommitteeContract::new(
            StateStore::new(MemoryBackend::new()),
            policy,
            CredentialIssuer::generate(),
        );
        let ledger = SigningKey::generate(&mut OsRng);
        contract.initialize_contract(&ctx("owner")).unwrap();
        contract
            .initialize_committee(
                &ctx("owner"),
                &InitializeCommitteeRequest {
                    ledger_verifying_key: encode_base64(ledger.verifying_key().as_bytes()),
                    initial_members: vec!["A".into(), "B".into(), "C".into()],
                },
            )
            .unwrap();
        (contract, ledger)
    }

    fn propose(contract: &CommitteeContract<MemoryBackend>, claims: serde_json::Value) -> String {
        contract
            .propose_resolution(
                &ctx("proposer"),
                &ProposeResolutionRequest {
                    credential: json!({ "subject": "did:example:subject", "claims": claims }),
                },
            )
            .unwrap()
            .resolution_identifier
    }

    #[test]
    fn test_operations_require_initialized_committee() {
        let contract = CommitteeContract::with_defaults(MemoryBackend::new());
        let err = contract.list_resolutions(&ctx("A")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        contract.initialize_contract(&ctx("owner")).unwrap();
        let err = contract.list_resolutions(&ctx("A")).unwrap_err();
        assert_eq!(err.to_string(), "not authorized: committee has not been initialized");
        assert_eq!(
            contract.initialize_contract(&ctx("owner")).unwrap_err().kind(),
            ErrorKind::State
        );
    }

    #[test]
    fn test_only_owner_initializes_committee_once() {
        let contract = CommitteeContract::with_defaults(MemoryBackend::new());
        contract.initialize_contract(&ctx("owner")).unwrap();
        let ledger = SigningKey::generate(&mut OsRng);
        let request = InitializeCommitteeRequest {
            ledger_verifying_key: encode_base64(ledger.verifying_key().as_bytes()),
            initial_members: vec!["A".into()],
        };

        assert_eq!(
            contract.initialize_committee(&ctx("mallory"), &request).unwrap_err().kind(),
            ErrorKind::Authorization
        );
        contract.initialize_committee(&ctx("owner"), &request).unwrap();
        assert_eq!(
            contract.initialize_committee(&ctx("owner"), &request).unwrap_err().kind(),
            ErrorKind::Authorization
        );
        assert_eq!(contract.members(&ctx("A")).unwrap(), vec!["A".to_string()]);
    }

    #[test]
    fn test_invalid_committee_request_leaves_state_untouched() {
        let contract = CommitteeContract::with_defaults(MemoryBackend::new());
        contract.initialize_contract(&ctx("owner")).unwrap();
        let before = contract.state_hash().unwrap();

        let bad_key = InitializeCommitteeRequest {
            ledger_verifying_key: "not-a-key".into(),
            initial_members: vec!["A".into()],
        };
        assert_eq!(
            contract.initialize_committee(&ctx("owner"), &bad_key).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(contract.state_hash().unwrap(), before);
    }

    #[test]
    fn test_non_member_cannot_vote() {
        let (contract, _) = setup(Box::new(MajorityPolicy));
        let id = propose(&contract, json!({ "x": 1 }));
        let err = contract.approve_resolution(&ctx("D"), &ResolutionRequest::new(&id)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_vote_on_unknown_resolution() {
        let (contract, _) = setup(Box::new(MajorityPolicy));
        let err = contract
            .approve_resolution(&ctx("A"), &ResolutionRequest::new("missing"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_rejected_vote_does_not_persist() {
        let (contract, _) = setup(Box::new(MajorityPolicy));
        let id = propose(&contract, json!({ "x": 1 }));
        contract.approve_resolution(&ctx("A"), &ResolutionRequest::new(&id)).unwrap();
        let before = contract.state_hash().unwrap();

        let err = contract.disapprove_resolution(&ctx("A"), &ResolutionRequest::new(&id)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(contract.state_hash().unwrap(), before);
    }

    #[test]
    fn test_policy_is_swappable() {
        let (contract, _) = setup(Box::new(UnanimousPolicy));
        let id = propose(&contract, json!({ "x": 1 }));
        let request = ResolutionRequest::new(&id);
        assert_eq!(contract.approve_resolution(&ctx("A"), &request).unwrap().status, ResolutionStatus::Pending);
        assert_eq!(contract.approve_resolution(&ctx("B"), &request).unwrap().status, ResolutionStatus::Pending);
        assert_eq!(contract.approve_resolution(&ctx("C"), &request).unwrap().status, ResolutionStatus::Approved);
    }

    #[test]
    fn test_issue_checks_ledger_before_resolution() {
        let (contract, ledger) = setup(Box::new(MajorityPolicy));
        let hash = contract.state_hash().unwrap();

        // Unknown resolution, bad signature: the signature is reported first
        let err = contract
            .issue_resolution_credential(
                &ctx("A").with_state_hash(hash),
                &IssueCredentialRequest {
                    ledger_signature: encode_base64(&[0u8; 64]),
                    resolution_identifier: "missing".into(),
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Crypto);

        let signature = encode_base64(&ledger.sign(&commitment_payload(CONTRACT, &hash)).to_bytes());
        let err = contract
            .issue_resolution_credential(
                &ctx("A").with_state_hash(hash),
                &IssueCredentialRequest {
                    ledger_signature: signature,
                    resolution_identifier: "missing".into(),
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_membership_change_requires_matching_approved_resolution() {
        let (contract, _) = setup(Box::new(MajorityPolicy));
        let id = propose(&contract, json!({ "committee_membership": { "action": "add", "member": "D" } }));
        let request = ResolutionRequest::new(&id);

        // Still pending
        assert_eq!(contract.add_member(&ctx("A"), &request).unwrap_err().kind(), ErrorKind::State);

        contract.approve_resolution(&ctx("A"), &request).unwrap();
        contract.approve_resolution(&ctx("B"), &request).unwrap();

        assert_eq!(contract.remove_member(&ctx("A"), &request).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(contract.add_member(&ctx("D"), &request).unwrap_err().kind(), ErrorKind::Authorization);

        let response = contract.add_member(&ctx("A"), &request).unwrap();
        assert_eq!(response.members, vec!["A", "B", "C", "D"]);
        assert_eq!(contract.add_member(&ctx("A"), &request).unwrap_err().kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_resolution_without_membership_claim_cannot_change_membership() {
        let (contract, _) = setup(Box::new(MajorityPolicy));
        let id = propose(&contract, json!({ "role": "treasurer" }));
        let request = ResolutionRequest::new(&id);
        contract.approve_resolution(&ctx("A"), &request).unwrap();
        contract.approve_resolution(&ctx("B"), &request).unwrap();
        assert_eq!(contract.add_member(&ctx("A"), &request).unwrap_err().kind(), ErrorKind::Validation);
    }
}
