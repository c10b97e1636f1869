// Inclusion-proof anchoring through a mocked transport: the verifier must
// fetch the STH, check its signature, fetch the audit path for the SCT's
// leaf and verify it against the signed root.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::sign::Signer;
use openssl::x509::{X509Builder, X509NameBuilder};
use serde_json::json;
use std::sync::Arc;

use ctverify::logclient::LogTransport;
use ctverify::merkle::leaf_hash;
use ctverify::model::{
    DigitallySigned, HashAlgorithm, MerkleLeafData, MerkleTreeLeaf, SignatureAlgorithm,
    SignedCertificateTimestamp, SignedEntry, SignedTreeHead, TimestampedEntry, Version,
};
use ctverify::policy::{LogInfo, LogState, LogStore, SctVerificationResult};
use ctverify::serialization::{
    encode_digitally_signed, encode_merkle_tree_leaf, sct_signed_data_x509, sth_signed_data,
};
use ctverify::{CtError, CtPolicy, CtVerifier, Result};

/// Serves canned get-sth and get-proof-by-hash responses
struct MockTransport {
    sth_body: Vec<u8>,
    proof_body: Vec<u8>,
}

#[async_trait]
impl LogTransport for MockTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        if url.ends_with("/ct/v1/get-sth") {
            Ok(self.sth_body.clone())
        } else if url.contains("/ct/v1/get-proof-by-hash?") {
            Ok(self.proof_body.clone())
        } else {
            Err(CtError::internal(format!("Unexpected URL {}", url)))
        }
    }

    async fn post(&self, url: &str, _body: Vec<u8>) -> Result<Vec<u8>> {
        Err(CtError::internal(format!("Unexpected POST to {}", url)))
    }
}

/// Transport where every request fails, as if the log were unreachable
struct DownTransport;

#[async_trait]
impl LogTransport for DownTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        Err(CtError::internal(format!("Connection refused: {}", url)))
    }
    async fn post(&self, url: &str, _body: Vec<u8>) -> Result<Vec<u8>> {
        Err(CtError::internal(format!("Connection refused: {}", url)))
    }
}

fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn sign(data: &[u8], key: &PKey<Private>) -> DigitallySigned {
    let mut signer = Signer::new(MessageDigest::sha256(), key).unwrap();
    DigitallySigned {
        hash_algorithm: HashAlgorithm::Sha256,
        signature_algorithm: SignatureAlgorithm::Ecdsa,
        signature: signer.sign_oneshot_to_vec(data).unwrap(),
    }
}

fn self_signed_cert_der(key: &PKey<Private>) -> Vec<u8> {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "leaf.example").unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();
    builder.sign(key, MessageDigest::sha256()).unwrap();
    builder.build().to_der().unwrap()
}

struct Fixture {
    log: LogInfo,
    log_key: PKey<Private>,
    sct: SignedCertificateTimestamp,
    chain: Vec<Vec<u8>>,
    /// Root of the single-leaf tree containing the SCT's entry
    root: [u8; 32],
}

/// A log whose entire tree is the one leaf promised by the SCT
fn single_leaf_fixture() -> Fixture {
    let log_key = ec_key();
    let log = LogInfo::new(
        log_key.public_key_to_der().unwrap(),
        "Test Operator",
        LogState::Usable,
    )
    .with_url("https://log.example");

    let cert_der = self_signed_cert_der(&ec_key());
    let timestamp = 1_700_000_123_000u64;

    let mut sct = SignedCertificateTimestamp {
        version: Version::V1,
        id: log.id,
        timestamp,
        extensions: vec![],
        signature: DigitallySigned {
            hash_algorithm: HashAlgorithm::Sha256,
            signature_algorithm: SignatureAlgorithm::Ecdsa,
            signature: vec![],
        },
    };
    let signed_data = sct_signed_data_x509(&sct, &cert_der).unwrap();
    sct.signature = sign(&signed_data, &log_key);

    let leaf = MerkleTreeLeaf {
        version: Version::V1,
        data: MerkleLeafData::TimestampedEntry(TimestampedEntry {
            timestamp,
            signed_entry: SignedEntry::X509 {
                certificate: cert_der.clone(),
            },
            extensions: vec![],
        }),
    };
    let root = leaf_hash(&encode_merkle_tree_leaf(&leaf).unwrap());

    Fixture {
        log,
        log_key,
        sct,
        chain: vec![cert_der],
        root,
    }
}

fn sth_response(root: [u8; 32], log_key: &PKey<Private>) -> Vec<u8> {
    let sth = SignedTreeHead {
        tree_size: 1,
        timestamp: 1_700_000_200_000,
        sha256_root_hash: root,
        signature: DigitallySigned {
            hash_algorithm: HashAlgorithm::Sha256,
            signature_algorithm: SignatureAlgorithm::Ecdsa,
            signature: vec![],
        },
    };
    let signature = sign(&sth_signed_data(&sth).unwrap(), log_key);
    serde_json::to_vec(&json!({
        "tree_size": 1,
        "timestamp": 1_700_000_200_000u64,
        "sha256_root_hash": BASE64.encode(root),
        "tree_head_signature": BASE64.encode(encode_digitally_signed(&signature).unwrap()),
    }))
    .unwrap()
}

fn proof_response() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "leaf_index": 0,
        "audit_path": Vec::<String>::new(),
    }))
    .unwrap()
}

fn inclusion_policy() -> CtPolicy {
    CtPolicy {
        min_valid_scts: 1,
        min_distinct_operators: 1,
        require_inclusion_proof: true,
    }
}

#[tokio::test]
async fn sct_anchored_by_inclusion_proof() {
    let fixture = single_leaf_fixture();
    let transport = Arc::new(MockTransport {
        sth_body: sth_response(fixture.root, &fixture.log_key),
        proof_body: proof_response(),
    });

    let verifier = CtVerifier::new(LogStore::from_logs(vec![fixture.log]).unwrap())
        .with_policy(inclusion_policy())
        .with_transport(transport);

    let result = verifier
        .verify_single_sct(&fixture.sct, &fixture.chain)
        .await
        .unwrap();
    assert_eq!(result, SctVerificationResult::Valid);
}

#[tokio::test]
async fn mismatched_root_fails_the_proof() {
    let fixture = single_leaf_fixture();
    // a correctly signed STH over a different tree
    let mut other_root = fixture.root;
    other_root[0] ^= 0xFF;
    let transport = Arc::new(MockTransport {
        sth_body: sth_response(other_root, &fixture.log_key),
        proof_body: proof_response(),
    });

    let verifier = CtVerifier::new(LogStore::from_logs(vec![fixture.log]).unwrap())
        .with_policy(inclusion_policy())
        .with_transport(transport);

    let result = verifier
        .verify_single_sct(&fixture.sct, &fixture.chain)
        .await
        .unwrap();
    assert_eq!(result, SctVerificationResult::ProofFailed);
}

#[tokio::test]
async fn forged_sth_signature_fails_the_proof() {
    let fixture = single_leaf_fixture();
    // STH signed by a key that is not the log's
    let transport = Arc::new(MockTransport {
        sth_body: sth_response(fixture.root, &ec_key()),
        proof_body: proof_response(),
    });

    let verifier = CtVerifier::new(LogStore::from_logs(vec![fixture.log]).unwrap())
        .with_policy(inclusion_policy())
        .with_transport(transport);

    let result = verifier
        .verify_single_sct(&fixture.sct, &fixture.chain)
        .await
        .unwrap();
    assert_eq!(result, SctVerificationResult::ProofFailed);
}

#[tokio::test]
async fn unreachable_log_reports_retrieval_failure() {
    let fixture = single_leaf_fixture();
    let verifier = CtVerifier::new(LogStore::from_logs(vec![fixture.log]).unwrap())
        .with_policy(inclusion_policy())
        .with_transport(Arc::new(DownTransport));

    let result = verifier
        .verify_single_sct(&fixture.sct, &fixture.chain)
        .await
        .unwrap();
    assert_eq!(result, SctVerificationResult::FailedToRetrieveProof);
}

#[tokio::test]
async fn log_without_url_reports_retrieval_failure() {
    let mut fixture = single_leaf_fixture();
    fixture.log.url = None;
    let verifier = CtVerifier::new(LogStore::from_logs(vec![fixture.log]).unwrap())
        .with_policy(inclusion_policy())
        .with_transport(Arc::new(DownTransport));

    let result = verifier
        .verify_single_sct(&fixture.sct, &fixture.chain)
        .await
        .unwrap();
    assert_eq!(result, SctVerificationResult::FailedToRetrieveProof);
}
