// CT log API client: request construction and response decoding

use super::responses::{
    AddChainRequest, AddChainResponse, GetEntriesResponse, GetEntryAndProofResponse,
    GetProofByHashResponse, GetSthConsistencyResponse, GetSthResponse,
};
use super::transport::LogTransport;
use crate::error::CtError;
use crate::model::{
    ConsistencyProof, InclusionProof, ParsedLogEntry, SignedCertificateTimestamp, SignedTreeHead,
    HASH_SIZE,
};
use crate::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Percent-encode the base64 characters that are reserved in a query string
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '+' => out.push_str("%2B"),
            '/' => out.push_str("%2F"),
            '=' => out.push_str("%3D"),
            other => out.push(other),
        }
    }
    out
}

/// Client for one CT log's `ct/v1` REST surface
pub struct LogClient<T: LogTransport + ?Sized> {
    base_url: String,
    transport: Arc<T>,
}

impl<T: LogTransport + ?Sized> LogClient<T> {
    /// `base_url` is the log's prefix, e.g. `https://ct.example.com/log`
    pub fn new(base_url: impl Into<String>, transport: Arc<T>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/ct/v1/{}", self.base_url, endpoint)
    }

    fn parse_response<R: DeserializeOwned>(&self, endpoint: &str, body: &[u8]) -> Result<R> {
        serde_json::from_slice(body).map_err(|e| {
            CtError::internal_with(format!("Bad response from {}", endpoint), e)
        })
    }

    async fn get_json<R: DeserializeOwned>(&self, endpoint: &str, query: &str) -> Result<R> {
        let url = if query.is_empty() {
            self.url(endpoint)
        } else {
            format!("{}?{}", self.url(endpoint), query)
        };
        debug!("GET {}", url);
        let body = self.transport.get(&url).await?;
        self.parse_response(endpoint, &body)
    }

    async fn submit_chain(
        &self,
        endpoint: &str,
        chain: &[Vec<u8>],
    ) -> Result<SignedCertificateTimestamp> {
        let request = AddChainRequest::from_der_chain(chain);
        let body = serde_json::to_vec(&request)?;
        let url = self.url(endpoint);
        debug!("POST {} ({} certificates)", url, chain.len());
        let response = self.transport.post(&url, body).await?;
        let parsed: AddChainResponse = self.parse_response(endpoint, &response)?;
        parsed.to_signed_certificate_timestamp()
    }

    /// Submit a certificate chain and obtain an SCT (RFC 6962 §4.1)
    pub async fn add_chain(&self, chain: &[Vec<u8>]) -> Result<SignedCertificateTimestamp> {
        self.submit_chain("add-chain", chain).await
    }

    /// Submit a precertificate chain and obtain an SCT (RFC 6962 §4.2)
    pub async fn add_pre_chain(&self, chain: &[Vec<u8>]) -> Result<SignedCertificateTimestamp> {
        self.submit_chain("add-pre-chain", chain).await
    }

    /// Fetch the log's latest signed tree head (RFC 6962 §4.3)
    pub async fn get_signed_tree_head(&self) -> Result<SignedTreeHead> {
        let response: GetSthResponse = self.get_json("get-sth", "").await?;
        response.to_signed_tree_head()
    }

    /// Fetch a consistency proof between two tree sizes (RFC 6962 §4.4)
    pub async fn get_consistency_proof(
        &self,
        first: u64,
        second: u64,
    ) -> Result<ConsistencyProof> {
        if first > second {
            return Err(CtError::internal(format!(
                "Tree size {} must not exceed {}",
                first, second
            )));
        }
        let query = format!("first={}&second={}", first, second);
        let response: GetSthConsistencyResponse =
            self.get_json("get-sth-consistency", &query).await?;
        response.to_consistency_proof(first, second)
    }

    /// Fetch the inclusion proof for a leaf hash (RFC 6962 §4.5)
    pub async fn get_proof_by_hash(
        &self,
        leaf_hash: &[u8; HASH_SIZE],
        tree_size: u64,
    ) -> Result<InclusionProof> {
        let hash = encode_query_value(&BASE64.encode(leaf_hash));
        let query = format!("hash={}&tree_size={}", hash, tree_size);
        let response: GetProofByHashResponse = self.get_json("get-proof-by-hash", &query).await?;
        response.to_inclusion_proof(tree_size)
    }

    /// Fetch entries `start..=end` from the log (RFC 6962 §4.6)
    pub async fn get_entries(&self, start: u64, end: u64) -> Result<Vec<ParsedLogEntry>> {
        if start > end {
            return Err(CtError::internal(format!(
                "Entry range start {} must not exceed end {}",
                start, end
            )));
        }
        let query = format!("start={}&end={}", start, end);
        let response: GetEntriesResponse = self.get_json("get-entries", &query).await?;
        response.to_parsed_log_entries()
    }

    /// Fetch one entry together with its audit path (RFC 6962 §4.8)
    pub async fn get_entry_and_proof(
        &self,
        leaf_index: u64,
        tree_size: u64,
    ) -> Result<(ParsedLogEntry, InclusionProof)> {
        let query = format!("leaf_index={}&tree_size={}", leaf_index, tree_size);
        let response: GetEntryAndProofResponse =
            self.get_json("get-entry-and-proof", &query).await?;
        response.to_entry_and_proof(leaf_index, tree_size)
    }
}
