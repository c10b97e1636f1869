// LogClient request/response flow against a scripted transport.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use std::sync::{Arc, Mutex};

use ctverify::logclient::{LogClient, LogTransport};
use ctverify::model::{
    DigitallySigned, HashAlgorithm, LogEntry, MerkleLeafData, SignatureAlgorithm, SignedEntry,
    Version,
};
use ctverify::serialization::encode_digitally_signed;
use ctverify::{CtError, Result};

/// Records every URL requested and replies from a script of bodies
struct ScriptedTransport {
    requests: Mutex<Vec<String>>,
    responses: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Vec<u8>>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses),
        }
    }

    fn next_response(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(CtError::internal("Script exhausted"));
        }
        Ok(responses.remove(0))
    }

    fn requested_urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.next_response(url)
    }
    async fn post(&self, url: &str, _body: Vec<u8>) -> Result<Vec<u8>> {
        self.next_response(url)
    }
}

fn dummy_signature() -> String {
    let signed = DigitallySigned {
        hash_algorithm: HashAlgorithm::Sha256,
        signature_algorithm: SignatureAlgorithm::Ecdsa,
        signature: vec![0xAB, 0xCD],
    };
    BASE64.encode(encode_digitally_signed(&signed).unwrap())
}

/// A minimal X509Entry MerkleTreeLeaf holding `cert` as the end entity
fn leaf_input(timestamp: u64, cert: &[u8]) -> Vec<u8> {
    let mut leaf = Vec::new();
    leaf.push(0); // v1
    leaf.push(0); // timestamped_entry
    leaf.extend_from_slice(&timestamp.to_be_bytes());
    leaf.extend_from_slice(&[0, 0]); // x509_entry
    leaf.push(0);
    leaf.extend_from_slice(&(cert.len() as u16).to_be_bytes());
    leaf.extend_from_slice(cert);
    leaf.extend_from_slice(&[0, 0]); // no extensions
    leaf
}

/// extra_data for an X509Entry: a 3-byte prefixed chain of 3-byte prefixed
/// certificates
fn x509_extra_data(chain: &[&[u8]]) -> Vec<u8> {
    let mut inner = Vec::new();
    for cert in chain {
        inner.push(0);
        inner.extend_from_slice(&(cert.len() as u16).to_be_bytes());
        inner.extend_from_slice(cert);
    }
    let mut out = Vec::new();
    out.push(0);
    out.extend_from_slice(&(inner.len() as u16).to_be_bytes());
    out.extend_from_slice(&inner);
    out
}

#[tokio::test]
async fn get_sth_hits_the_v1_endpoint() {
    let body = serde_json::to_vec(&json!({
        "tree_size": 42,
        "timestamp": 1_700_000_000_000u64,
        "sha256_root_hash": BASE64.encode([7u8; 32]),
        "tree_head_signature": dummy_signature(),
    }))
    .unwrap();
    let transport = Arc::new(ScriptedTransport::new(vec![body]));
    let client = LogClient::new("https://log.example", transport.clone());

    let sth = client.get_signed_tree_head().await.unwrap();
    assert_eq!(sth.tree_size, 42);
    assert_eq!(sth.sha256_root_hash, [7u8; 32]);
    assert_eq!(
        transport.requested_urls(),
        vec!["https://log.example/ct/v1/get-sth".to_string()]
    );
}

#[tokio::test]
async fn get_entries_parses_leaves_and_chains() {
    let end_entity = vec![0x30, 0x03, 0x02, 0x01, 0x01];
    let issuer = vec![0x30, 0x03, 0x02, 0x01, 0x02];
    let body = serde_json::to_vec(&json!({
        "entries": [{
            "leaf_input": BASE64.encode(leaf_input(1234, &end_entity)),
            "extra_data": BASE64.encode(x509_extra_data(&[&issuer])),
        }]
    }))
    .unwrap();
    let transport = Arc::new(ScriptedTransport::new(vec![body]));
    let client = LogClient::new("https://log.example", transport.clone());

    let entries = client.get_entries(0, 0).await.unwrap();
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry.leaf.version, Version::V1);
    match &entry.leaf.data {
        MerkleLeafData::TimestampedEntry(timestamped) => {
            assert_eq!(timestamped.timestamp, 1234);
            assert_eq!(
                timestamped.signed_entry,
                SignedEntry::X509 {
                    certificate: end_entity.clone()
                }
            );
        }
        other => panic!("unexpected leaf data {:?}", other),
    }
    assert_eq!(
        entry.log_entry,
        LogEntry::X509Chain {
            certificate_chain: vec![issuer]
        }
    );
    assert_eq!(
        transport.requested_urls(),
        vec!["https://log.example/ct/v1/get-entries?start=0&end=0".to_string()]
    );
}

#[tokio::test]
async fn proof_by_hash_query_is_percent_encoded() {
    let body = serde_json::to_vec(&json!({
        "leaf_index": 3,
        "audit_path": [BASE64.encode([1u8; 32])],
    }))
    .unwrap();
    let transport = Arc::new(ScriptedTransport::new(vec![body]));
    let client = LogClient::new("https://log.example", transport.clone());

    // 0xFF.. base64-encodes with '/' and '+' characters
    let hash = [0xFFu8; 32];
    let proof = client.get_proof_by_hash(&hash, 10).await.unwrap();
    assert_eq!(proof.leaf_index, 3);
    assert_eq!(proof.tree_size, 10);

    let url = &transport.requested_urls()[0];
    assert!(url.starts_with("https://log.example/ct/v1/get-proof-by-hash?hash="));
    assert!(url.ends_with("&tree_size=10"));
    let query = url.split_once('?').unwrap().1;
    assert!(!query.contains('/') && !query.contains('+') && !query.contains("=="));
    assert!(query.contains("%2F") && query.contains("%3D"));
}

#[tokio::test]
async fn add_chain_returns_the_logs_sct() {
    let body = serde_json::to_vec(&json!({
        "sct_version": 0,
        "id": BASE64.encode([9u8; 32]),
        "timestamp": 1_700_000_000_123u64,
        "extensions": "",
        "signature": dummy_signature(),
    }))
    .unwrap();
    let transport = Arc::new(ScriptedTransport::new(vec![body]));
    let client = LogClient::new("https://log.example", transport.clone());

    let sct = client.add_chain(&[vec![0x30, 0x00]]).await.unwrap();
    assert_eq!(sct.timestamp, 1_700_000_000_123);
    assert_eq!(sct.id.as_bytes(), &[9u8; 32]);
    assert_eq!(
        transport.requested_urls(),
        vec!["https://log.example/ct/v1/add-chain".to_string()]
    );
}

#[tokio::test]
async fn inverted_ranges_are_rejected_without_a_request() {
    let transport = Arc::new(ScriptedTransport::new(vec![]));
    let client = LogClient::new("https://log.example", transport.clone());

    assert!(client.get_entries(5, 2).await.is_err());
    assert!(client.get_consistency_proof(9, 3).await.is_err());
    assert!(transport.requested_urls().is_empty());
}
