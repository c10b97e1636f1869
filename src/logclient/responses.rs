// JSON envelopes of the CT log REST API (RFC 6962 §4)
//
// Every binary field arrives base64-encoded inside JSON: decode the base64
// first, then apply the binary codec. A bad base64 field surfaces as
// `InvalidEncoding` naming the offending field, never as a raw decode panic
// or an unrelated error.

use crate::error::CtError;
use crate::model::{
    ConsistencyProof, InclusionProof, LogId, ParsedLogEntry, SignedCertificateTimestamp,
    SignedTreeHead, Version, HASH_SIZE,
};
use crate::serialization::{parse_digitally_signed, parse_log_entry};
use crate::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Decode a base64 JSON field, naming the field on failure
fn decode_field(value: &str, field: &str) -> Result<Vec<u8>> {
    BASE64.decode(value).map_err(|_| CtError::InvalidEncoding {
        message: format!("Bad response. The {} is invalid.", field),
    })
}

fn decode_hash_field(value: &str, field: &str) -> Result<[u8; HASH_SIZE]> {
    let bytes = decode_field(value, field)?;
    bytes.as_slice().try_into().map_err(|_| {
        CtError::malformed(format!(
            "The {} must be {} bytes, got {}",
            field,
            HASH_SIZE,
            bytes.len()
        ))
    })
}

/// Request body for add-chain and add-pre-chain
#[derive(Debug, Serialize)]
pub struct AddChainRequest {
    /// Base64 DER certificates, leaf first
    pub chain: Vec<String>,
}

impl AddChainRequest {
    pub fn from_der_chain(chain: &[Vec<u8>]) -> Self {
        Self {
            chain: chain.iter().map(|der| BASE64.encode(der)).collect(),
        }
    }
}

/// Response of add-chain / add-pre-chain (RFC 6962 §4.1, §4.2)
#[derive(Debug, Deserialize)]
pub struct AddChainResponse {
    pub sct_version: u8,
    pub id: String,
    pub timestamp: u64,
    #[serde(default)]
    pub extensions: String,
    pub signature: String,
}

impl AddChainResponse {
    pub fn to_signed_certificate_timestamp(&self) -> Result<SignedCertificateTimestamp> {
        let id = LogId::from_bytes(&decode_field(&self.id, "id")?)?;
        let extensions = if self.extensions.is_empty() {
            Vec::new()
        } else {
            decode_field(&self.extensions, "extensions")?
        };
        let signature = parse_digitally_signed(&decode_field(&self.signature, "signature")?)?;
        Ok(SignedCertificateTimestamp {
            version: Version::from_number(self.sct_version),
            id,
            timestamp: self.timestamp,
            extensions,
            signature,
        })
    }
}

/// Response of get-sth (RFC 6962 §4.3)
#[derive(Debug, Deserialize)]
pub struct GetSthResponse {
    pub tree_size: u64,
    pub timestamp: u64,
    pub sha256_root_hash: String,
    pub tree_head_signature: String,
}

impl GetSthResponse {
    pub fn to_signed_tree_head(&self) -> Result<SignedTreeHead> {
        let sha256_root_hash = decode_hash_field(&self.sha256_root_hash, "sha256RootHash")?;
        let signature =
            parse_digitally_signed(&decode_field(&self.tree_head_signature, "treeHeadSignature")?)?;
        Ok(SignedTreeHead {
            tree_size: self.tree_size,
            timestamp: self.timestamp,
            sha256_root_hash,
            signature,
        })
    }
}

/// One entry of a get-entries response
#[derive(Debug, Deserialize)]
pub struct EntryResponse {
    pub leaf_input: String,
    pub extra_data: String,
}

/// Response of get-entries (RFC 6962 §4.6)
#[derive(Debug, Deserialize)]
pub struct GetEntriesResponse {
    pub entries: Vec<EntryResponse>,
}

impl GetEntriesResponse {
    pub fn to_parsed_log_entries(&self) -> Result<Vec<ParsedLogEntry>> {
        self.entries
            .iter()
            .map(|entry| {
                let leaf_input = decode_field(&entry.leaf_input, "leafInput")?;
                let extra_data = decode_field(&entry.extra_data, "extraData")?;
                parse_log_entry(&leaf_input, &extra_data)
            })
            .collect()
    }
}

fn decode_path(path: &[String], field: &str) -> Result<Vec<[u8; HASH_SIZE]>> {
    path.iter()
        .map(|node| decode_hash_field(node, field))
        .collect()
}

/// Response of get-proof-by-hash (RFC 6962 §4.5)
#[derive(Debug, Deserialize)]
pub struct GetProofByHashResponse {
    pub leaf_index: u64,
    pub audit_path: Vec<String>,
}

impl GetProofByHashResponse {
    pub fn to_inclusion_proof(&self, tree_size: u64) -> Result<InclusionProof> {
        Ok(InclusionProof {
            leaf_index: self.leaf_index,
            tree_size,
            audit_path: decode_path(&self.audit_path, "auditPath")?,
        })
    }
}

/// Response of get-sth-consistency (RFC 6962 §4.4)
#[derive(Debug, Deserialize)]
pub struct GetSthConsistencyResponse {
    pub consistency: Vec<String>,
}

impl GetSthConsistencyResponse {
    pub fn to_consistency_proof(&self, first: u64, second: u64) -> Result<ConsistencyProof> {
        Ok(ConsistencyProof {
            first_tree_size: first,
            second_tree_size: second,
            path: decode_path(&self.consistency, "consistency")?,
        })
    }
}

/// Response of get-entry-and-proof (RFC 6962 §4.8)
#[derive(Debug, Deserialize)]
pub struct GetEntryAndProofResponse {
    pub leaf_input: String,
    pub extra_data: String,
    pub audit_path: Vec<String>,
}

impl GetEntryAndProofResponse {
    pub fn to_entry_and_proof(
        &self,
        leaf_index: u64,
        tree_size: u64,
    ) -> Result<(ParsedLogEntry, InclusionProof)> {
        let leaf_input = decode_field(&self.leaf_input, "leafInput")?;
        let extra_data = decode_field(&self.extra_data, "extraData")?;
        let entry = parse_log_entry(&leaf_input, &extra_data)?;
        let proof = InclusionProof {
            leaf_index,
            tree_size,
            audit_path: decode_path(&self.audit_path, "auditPath")?,
        };
        Ok((entry, proof))
    }
}
