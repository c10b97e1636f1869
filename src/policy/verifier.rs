// SCT and certificate verification against a trust store and policy

use super::store::{LogInfo, LogState, LogStore};
use super::{CertificateVerificationResult, CtPolicy, SctOutcome, SctVerificationResult, Verdict};
use crate::certificates::info::{extract_embedded_scts, has_embedded_sct, is_pre_certificate};
use crate::certificates::precert::reconstruct_precert_entry;
use crate::error::CtError;
use crate::logclient::{LogClient, LogTransport};
use crate::merkle::leaf_hash;
use crate::merkle::verifier::verify_inclusion_of_hash;
use crate::model::{
    DigitallySigned, HashAlgorithm, MerkleLeafData, MerkleTreeLeaf, SignatureAlgorithm,
    SignedCertificateTimestamp, SignedEntry, SignedTreeHead, TimestampedEntry,
};
use crate::serialization::{
    encode_merkle_tree_leaf, sct_signed_data_precert, sct_signed_data_x509, sth_signed_data,
};
use crate::Result;
use futures::future::join_all;
use openssl::hash::MessageDigest;
use openssl::pkey::{Id, PKey};
use openssl::sign::Verifier;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Verifies SCTs and aggregates them into certificate-level verdicts
///
/// Construction is cheap; the verifier borrows nothing and can be shared
/// across tasks behind an `Arc`. A transport is only needed when the policy
/// demands inclusion proofs.
pub struct CtVerifier {
    store: LogStore,
    policy: CtPolicy,
    transport: Option<Arc<dyn LogTransport>>,
}

impl CtVerifier {
    pub fn new(store: LogStore) -> Self {
        Self {
            store,
            policy: CtPolicy::default(),
            transport: None,
        }
    }

    pub fn with_policy(mut self, policy: CtPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn LogTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Recover the entry the log signed: a PreCert entry when the leaf is a
    /// precertificate or carries embedded SCTs, an X509 entry otherwise
    fn signed_entry_for_chain(&self, chain: &[Vec<u8>]) -> Result<SignedEntry> {
        let leaf = chain
            .first()
            .ok_or_else(|| CtError::malformed("Certificate chain is empty"))?;
        if is_pre_certificate(leaf)? || has_embedded_sct(leaf)? {
            let entry = reconstruct_precert_entry(chain)?;
            Ok(SignedEntry::Precert {
                issuer_key_hash: entry.issuer_key_hash,
                tbs_certificate: entry.tbs_certificate,
            })
        } else {
            Ok(SignedEntry::X509 {
                certificate: leaf.clone(),
            })
        }
    }

    fn verify_with_key(
        &self,
        public_key_der: &[u8],
        signed: &DigitallySigned,
        data: &[u8],
    ) -> Result<bool> {
        if signed.hash_algorithm != HashAlgorithm::Sha256 {
            warn!(
                "Unsupported hash algorithm {:?} in signature",
                signed.hash_algorithm
            );
            return Ok(false);
        }

        let key = PKey::public_key_from_der(public_key_der)
            .map_err(|e| CtError::internal_with("Failed to parse log public key", e))?;

        let algorithm_matches = match signed.signature_algorithm {
            SignatureAlgorithm::Ecdsa => key.id() == Id::EC,
            SignatureAlgorithm::Rsa => key.id() == Id::RSA,
            _ => false,
        };
        if !algorithm_matches {
            warn!(
                "Signature algorithm {:?} does not match the log's key type",
                signed.signature_algorithm
            );
            return Ok(false);
        }

        let mut verifier = Verifier::new(MessageDigest::sha256(), &key)?;
        // a structurally invalid signature blob is just a bad signature
        Ok(verifier
            .verify_oneshot(&signed.signature, data)
            .unwrap_or(false))
    }

    /// Verify one SCT against the chain it covers. `chain[0]` is the leaf
    /// certificate, followed by its issuers in order.
    ///
    /// Verification failures come back as result values; `Err` is reserved
    /// for malformed inputs and internal faults.
    pub async fn verify_single_sct(
        &self,
        sct: &SignedCertificateTimestamp,
        chain: &[Vec<u8>],
    ) -> Result<SctVerificationResult> {
        let Some(log) = self.store.find(&sct.id) else {
            debug!("SCT from unknown log");
            return Ok(SctVerificationResult::UnknownLog);
        };

        if log.state == LogState::Rejected {
            warn!("SCT from rejected log operated by {}", log.operator);
            return Ok(SctVerificationResult::UntrustedLog);
        }
        if !log.accepts_timestamp(sct.timestamp) {
            warn!(
                "SCT timestamp {} outside the acceptance window of log operated by {}",
                sct.timestamp, log.operator
            );
            return Ok(SctVerificationResult::UntrustedLog);
        }

        let signed_entry = self.signed_entry_for_chain(chain)?;
        let signed_data = match &signed_entry {
            SignedEntry::X509 { certificate } => sct_signed_data_x509(sct, certificate)?,
            SignedEntry::Precert {
                issuer_key_hash,
                tbs_certificate,
            } => sct_signed_data_precert(sct, *issuer_key_hash, tbs_certificate)?,
            SignedEntry::Unknown { entry_type, .. } => {
                return Err(CtError::internal(format!(
                    "Cannot verify entry of unrecognized type {}",
                    entry_type
                )));
            }
        };

        if !self.verify_with_key(&log.public_key, &sct.signature, &signed_data)? {
            return Ok(SctVerificationResult::InvalidSignature);
        }

        if self.policy.require_inclusion_proof {
            return self.verify_inclusion(sct, signed_entry, log).await;
        }

        Ok(SctVerificationResult::Valid)
    }

    /// Check an STH signature against the issuing log's key
    pub fn verify_signed_tree_head(&self, sth: &SignedTreeHead, log: &LogInfo) -> Result<bool> {
        let signed_data = sth_signed_data(sth)?;
        self.verify_with_key(&log.public_key, &sth.signature, &signed_data)
    }

    /// Anchor an SCT by fetching the log's current STH and an inclusion
    /// proof for the leaf the SCT promises
    async fn verify_inclusion(
        &self,
        sct: &SignedCertificateTimestamp,
        signed_entry: SignedEntry,
        log: &LogInfo,
    ) -> Result<SctVerificationResult> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| {
                CtError::internal("Inclusion proofs are required but no transport is configured")
            })?
            .clone();
        let Some(url) = &log.url else {
            warn!("No URL known for log operated by {}", log.operator);
            return Ok(SctVerificationResult::FailedToRetrieveProof);
        };

        let leaf = MerkleTreeLeaf {
            version: sct.version,
            data: MerkleLeafData::TimestampedEntry(TimestampedEntry {
                timestamp: sct.timestamp,
                signed_entry,
                extensions: sct.extensions.clone(),
            }),
        };
        let hash = leaf_hash(&encode_merkle_tree_leaf(&leaf)?);

        let client = LogClient::new(url.clone(), transport);

        let sth = match client.get_signed_tree_head().await {
            Ok(sth) => sth,
            Err(e) => {
                warn!("Failed to fetch STH from {}: {}", url, e);
                return Ok(SctVerificationResult::FailedToRetrieveProof);
            }
        };
        if !self.verify_signed_tree_head(&sth, log)? {
            warn!("STH signature from {} does not verify", url);
            return Ok(SctVerificationResult::ProofFailed);
        }

        let proof = match client.get_proof_by_hash(&hash, sth.tree_size).await {
            Ok(proof) => proof,
            Err(e) => {
                warn!("Failed to fetch inclusion proof from {}: {}", url, e);
                return Ok(SctVerificationResult::FailedToRetrieveProof);
            }
        };

        if verify_inclusion_of_hash(
            &hash,
            proof.leaf_index,
            proof.tree_size,
            &proof.audit_path,
            &sth.sha256_root_hash,
        ) {
            Ok(SctVerificationResult::Valid)
        } else {
            Ok(SctVerificationResult::ProofFailed)
        }
    }

    /// Verify a certificate chain using the SCTs embedded in its leaf
    pub async fn verify_certificate(
        &self,
        chain: &[Vec<u8>],
    ) -> Result<CertificateVerificationResult> {
        let leaf = chain
            .first()
            .ok_or_else(|| CtError::malformed("Certificate chain is empty"))?;
        let scts = extract_embedded_scts(leaf)?;
        self.verify_certificate_with_scts(chain, &scts).await
    }

    /// Verify a certificate chain against SCTs gathered from any source
    /// (embedded, TLS extension, or stapled OCSP)
    pub async fn verify_certificate_with_scts(
        &self,
        chain: &[Vec<u8>],
        scts: &[SignedCertificateTimestamp],
    ) -> Result<CertificateVerificationResult> {
        if scts.is_empty() {
            debug!("No SCTs presented for the certificate");
            return Ok(CertificateVerificationResult {
                sct_results: Vec::new(),
                verdict: Verdict::NotTrusted,
            });
        }

        let checks = scts.iter().map(|sct| self.verify_single_sct(sct, chain));
        let results = join_all(checks).await;

        let mut sct_results = Vec::with_capacity(scts.len());
        for (sct, result) in scts.iter().zip(results) {
            let result = result?;
            sct_results.push(SctOutcome {
                log_id: sct.id,
                timestamp: sct.timestamp,
                operator: self.store.find(&sct.id).map(|log| log.operator.clone()),
                result,
            });
        }

        Ok(CertificateVerificationResult {
            verdict: self.apply_policy(&sct_results),
            sct_results,
        })
    }

    /// Count valid SCTs from logs in a qualifying state and compare against
    /// the policy thresholds
    fn apply_policy(&self, outcomes: &[SctOutcome]) -> Verdict {
        let qualifying: Vec<&SctOutcome> = outcomes
            .iter()
            .filter(|o| {
                o.result.is_valid()
                    && self
                        .store
                        .find(&o.log_id)
                        .map(|log| log.state.is_qualifying())
                        .unwrap_or(false)
            })
            .collect();

        let operators: HashSet<&str> = qualifying
            .iter()
            .filter_map(|o| o.operator.as_deref())
            .collect();

        if qualifying.len() >= self.policy.min_valid_scts
            && operators.len() >= self.policy.min_distinct_operators
        {
            Verdict::Trusted
        } else {
            Verdict::NotTrusted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogId, Version};

    fn outcome(id: u8, operator: &str, result: SctVerificationResult) -> SctOutcome {
        SctOutcome {
            log_id: LogId([id; 32]),
            timestamp: 1,
            operator: Some(operator.to_string()),
            result,
        }
    }

    fn store_with(ids_and_states: &[(u8, &str, LogState)]) -> LogStore {
        let logs = ids_and_states
            .iter()
            .map(|(id, operator, state)| {
                let mut info = LogInfo::new(vec![*id], operator.to_string(), *state);
                info.id = LogId([*id; 32]);
                info
            })
            .collect();
        LogStore::from_logs(logs).unwrap()
    }

    #[test]
    fn test_policy_counts_only_qualifying_logs() {
        let store = store_with(&[
            (1, "A", LogState::Usable),
            (2, "B", LogState::Pending),
        ]);
        let verifier = CtVerifier::new(store).with_policy(CtPolicy {
            min_valid_scts: 2,
            min_distinct_operators: 1,
            require_inclusion_proof: false,
        });

        let outcomes = vec![
            outcome(1, "A", SctVerificationResult::Valid),
            outcome(2, "B", SctVerificationResult::Valid),
        ];
        // the SCT from the pending log does not count
        assert_eq!(verifier.apply_policy(&outcomes), Verdict::NotTrusted);
    }

    #[test]
    fn test_policy_operator_diversity() {
        let store = store_with(&[
            (1, "A", LogState::Usable),
            (2, "A", LogState::Usable),
            (3, "B", LogState::Usable),
        ]);
        let verifier = CtVerifier::new(store).with_policy(CtPolicy {
            min_valid_scts: 2,
            min_distinct_operators: 2,
            require_inclusion_proof: false,
        });

        let same_operator = vec![
            outcome(1, "A", SctVerificationResult::Valid),
            outcome(2, "A", SctVerificationResult::Valid),
        ];
        assert_eq!(verifier.apply_policy(&same_operator), Verdict::NotTrusted);

        let diverse = vec![
            outcome(1, "A", SctVerificationResult::Valid),
            outcome(3, "B", SctVerificationResult::Valid),
        ];
        assert_eq!(verifier.apply_policy(&diverse), Verdict::Trusted);
    }

    #[tokio::test]
    async fn test_unknown_log() {
        let verifier = CtVerifier::new(LogStore::default());
        let sct = SignedCertificateTimestamp {
            version: Version::V1,
            id: LogId([9u8; 32]),
            timestamp: 1,
            extensions: vec![],
            signature: DigitallySigned {
                hash_algorithm: HashAlgorithm::Sha256,
                signature_algorithm: SignatureAlgorithm::Ecdsa,
                signature: vec![0],
            },
        };
        let result = verifier.verify_single_sct(&sct, &[vec![0x30]]).await.unwrap();
        assert_eq!(result, SctVerificationResult::UnknownLog);
    }
}
