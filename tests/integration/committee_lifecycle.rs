// End-to-end committee lifecycle against a configured, file-backed deployment:
// 1. Configure a contract and generate its issuer key
// 2. Initialize the contract and the committee
// 3. Propose, vote and tally under the configured rule
// 4. Attest the state with the ledger key and issue the credential
// 5. Reopen the deployment and check nothing was lost

use ed25519_dalek::{Signer, SigningKey};
use icn_cli::commands::keygen::KeyFile;
use icn_cli::CliContext;
use icn_committee::crypto::encode_base64;
use icn_committee::{
    commitment_payload, ErrorKind, InitializeCommitteeRequest, IssueCredentialRequest, ProposeResolutionRequest,
    ResolutionRequest, ResolutionStatus, TallyRule,
};
use icn_config::{load_committee_config, CommitteeConfig};
use rand::rngs::OsRng;
use serde_json::json;
use std::path::Path;
use tempfile::tempdir;

fn deploy(data_dir: &Path, rule: TallyRule) -> anyhow::Result<SigningKey> {
    let mut config = CommitteeConfig::new("lifecycle-contract");
    config.tally.rule = rule;
    config.save(&data_dir.join(icn_config::CONFIG_FILE_NAME))?;

    let (issuer, _) = KeyFile::generate();
    issuer.save(&config.issuer_key_path(data_dir), false)?;

    let owner = CliContext::new(data_dir.to_path_buf(), "owner".into(), false);
    let contract = owner.open_contract(&config)?;
    contract.initialize_contract(&owner.invocation(&config, &contract)?)?;

    let ledger = SigningKey::generate(&mut OsRng);
    contract.initialize_committee(
        &owner.invocation(&config, &contract)?,
        &InitializeCommitteeRequest {
            ledger_verifying_key: encode_base64(ledger.verifying_key().as_bytes()),
            initial_members: vec!["alice".into(), "bob".into(), "carol".into(), "dave".into()],
        },
    )?;
    Ok(ledger)
}

#[test]
fn test_threshold_committee_lifecycle() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let data_dir = temp_dir.path();
    let ledger = deploy(data_dir, TallyRule::Threshold(75))?;

    let config = load_committee_config(&data_dir.join(icn_config::CONFIG_FILE_NAME))?;
    assert_eq!(config.tally.rule, TallyRule::Threshold(75));

    let as_member = |who: &str| CliContext::new(data_dir.to_path_buf(), who.to_string(), false);

    let alice = as_member("alice");
    let contract = alice.open_contract(&config)?;
    let id = contract
        .propose_resolution(
            &alice.invocation(&config, &contract)?,
            &ProposeResolutionRequest {
                credential: json!({
                    "subject": "did:example:coop-7",
                    "claims": { "membership": "full", "since": "2025-01-01" }
                }),
            },
        )?
        .resolution_identifier;

    // 75% of 4 needs three approvals
    let mut statuses = Vec::new();
    for who in ["alice", "bob", "carol"] {
        let ctx = as_member(who);
        let response = contract.approve_resolution(&ctx.invocation(&config, &contract)?, &ResolutionRequest::new(&id))?;
        statuses.push(response.status);
    }
    assert_eq!(
        statuses,
        vec![ResolutionStatus::Pending, ResolutionStatus::Pending, ResolutionStatus::Approved]
    );

    // The ledger witnesses the post-approval state
    let attested = contract.state_hash()?;
    let signature = encode_base64(&ledger.sign(&commitment_payload(&config.contract_id, &attested)).to_bytes());

    let dave = as_member("dave");
    let credential = contract.issue_resolution_credential(
        &dave.invocation(&config, &contract)?,
        &IssueCredentialRequest {
            ledger_signature: signature.clone(),
            resolution_identifier: id.clone(),
        },
    )?;
    credential.verify().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(credential.credential_subject.claims["membership"], json!("full"));
    drop(contract);

    // Reopen from disk: votes and status survived, issuance is repeatable against the same state
    let reopened = dave.open_contract(&config)?;
    assert_eq!(reopened.state_hash()?, attested);
    let status = reopened.resolution_status(&dave.invocation(&config, &reopened)?, &ResolutionRequest::new(&id))?;
    assert_eq!(status.status, ResolutionStatus::Approved);
    assert_eq!(status.positive_votes, vec!["alice", "bob", "carol"]);

    let err = reopened
        .approve_resolution(&dave.invocation(&config, &reopened)?, &ResolutionRequest::new(&id))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    Ok(())
}

#[test]
fn test_state_change_invalidates_attestation() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let data_dir = temp_dir.path();
    let ledger = deploy(data_dir, TallyRule::Majority)?;
    let config = load_committee_config(&data_dir.join(icn_config::CONFIG_FILE_NAME))?;

    let alice = CliContext::new(data_dir.to_path_buf(), "alice".into(), false);
    let contract = alice.open_contract(&config)?;
    let propose = |n: u32| {
        contract.propose_resolution(
            &alice.invocation(&config, &contract)?,
            &ProposeResolutionRequest {
                credential: json!({ "subject": "s", "claims": { "n": n } }),
            },
        )
        .map(|r| r.resolution_identifier)
        .map_err(anyhow::Error::from)
    };

    let id = propose(1)?;
    for who in ["alice", "bob", "carol"] {
        let ctx = CliContext::new(data_dir.to_path_buf(), who.to_string(), false);
        contract.approve_resolution(&ctx.invocation(&config, &contract)?, &ResolutionRequest::new(&id))?;
    }
    let stale = contract.state_hash()?;
    let signature = encode_base64(&ledger.sign(&commitment_payload(&config.contract_id, &stale)).to_bytes());

    // The contract moves on before the credential is requested
    propose(2)?;

    let err = contract
        .issue_resolution_credential(
            &alice.invocation(&config, &contract)?,
            &IssueCredentialRequest {
                ledger_signature: signature,
                resolution_identifier: id,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Crypto);
    Ok(())
}
