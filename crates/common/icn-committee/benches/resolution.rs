use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ed25519_dalek::SigningKey;
use icn_committee::crypto::encode_base64;
use icn_committee::{
    CommitteeContract, Credential, InitializeCommitteeRequest, InvocationContext, MajorityPolicy,
    MemoryBackend, ProposeResolutionRequest, Resolution, ResolutionRequest, TallyPolicy,
};
use rand::rngs::OsRng;
use serde_json::json;

fn ctx(who: &str) -> InvocationContext {
    InvocationContext::new(who, "bench-contract")
}

fn members(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("member-{}", i)).collect()
}

fn committee_contract(size: usize) -> CommitteeContract<MemoryBackend> {
    let contract = CommitteeContract::with_defaults(MemoryBackend::new());
    let ledger = SigningKey::generate(&mut OsRng);
    contract.initialize_contract(&ctx("owner")).unwrap();
    contract
        .initialize_committee(
            &ctx("owner"),
            &InitializeCommitteeRequest {
                ledger_verifying_key: encode_base64(ledger.verifying_key().as_bytes()),
                initial_members: members(size),
            },
        )
        .unwrap();
    contract
}

fn bench_resolution_id(c: &mut Criterion) {
    let credential = Credential::from_value(json!({
        "subject": "did:example:subject",
        "claims": { "role": "treasurer", "term": { "start": 2025, "end": 2027 } }
    }))
    .unwrap();

    c.bench_function("resolution_id", |b| {
        b.iter(|| Resolution::new(black_box(&credential)).unwrap())
    });
}

fn bench_majority_tally(c: &mut Criterion) {
    let mut group = c.benchmark_group("majority_tally");
    for size in [5usize, 50, 500] {
        let committee = members(size);
        let positive = committee[..size / 2].to_vec();
        let negative = committee[size / 2..size / 2 + 1].to_vec();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| MajorityPolicy.decide(black_box(&committee), &positive, &negative))
        });
    }
    group.finish();
}

fn bench_propose_and_approve(c: &mut Criterion) {
    let mut group = c.benchmark_group("propose_and_approve");
    for size in [3usize, 25] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let contract = committee_contract(size);
            let mut n = 0u64;
            b.iter(|| {
                n += 1;
                let id = contract
                    .propose_resolution(
                        &ctx("proposer"),
                        &ProposeResolutionRequest {
                            credential: json!({ "subject": "did:example:s", "claims": { "n": n } }),
                        },
                    )
                    .unwrap()
                    .resolution_identifier;
                for member in members(size / 2 + 1) {
                    contract
                        .approve_resolution(&ctx(&member), &ResolutionRequest::new(&id))
                        .unwrap();
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolution_id, bench_majority_tally, bench_propose_and_approve);
criterion_main!(benches);
