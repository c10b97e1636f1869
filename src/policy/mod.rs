// Trust policy engine
//
// Holds the immutable store of known logs, verifies SCT signatures against
// log keys, optionally anchors SCTs with Merkle inclusion proofs, and
// aggregates per-SCT outcomes into a certificate-level verdict. Signature,
// proof and lookup failures are values here, not errors: "this SCT doesn't
// verify" is a routinely-occurring outcome.

pub mod store;
pub mod verifier;

pub use store::{LogInfo, LogRecord, LogState, LogStore};
pub use verifier::CtVerifier;

use crate::model::LogId;
use serde::{Deserialize, Serialize};

/// Outcome of verifying a single SCT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SctVerificationResult {
    /// Signature verified and, when required, the inclusion proof held
    Valid,
    /// Signature does not verify against the log's key, or the declared
    /// algorithm pair is unsupported/mismatched
    InvalidSignature,
    /// The log is known but not trusted (rejected state, or the SCT falls
    /// outside the log's accepted validity window)
    UntrustedLog,
    /// The SCT's log ID is absent from the trust store
    UnknownLog,
    /// An inclusion or tree-head proof was obtained but does not verify
    ProofFailed,
    /// The proof could not be fetched (network failure or timeout); absence
    /// of evidence, distinguished from invalid evidence
    FailedToRetrieveProof,
}

impl SctVerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, SctVerificationResult::Valid)
    }
}

/// Certificate-level policy verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Trusted,
    NotTrusted,
}

/// Per-SCT outcome inside a certificate verification result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SctOutcome {
    pub log_id: LogId,
    /// SCT issuance time, epoch milliseconds
    pub timestamp: u64,
    /// Operator of the log, when the log is known
    pub operator: Option<String>,
    pub result: SctVerificationResult,
}

/// Aggregate verification result for one certificate chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateVerificationResult {
    pub sct_results: Vec<SctOutcome>,
    pub verdict: Verdict,
}

impl CertificateVerificationResult {
    pub fn is_trusted(&self) -> bool {
        self.verdict == Verdict::Trusted
    }

    pub fn valid_sct_count(&self) -> usize {
        self.sct_results
            .iter()
            .filter(|o| o.result.is_valid())
            .count()
    }
}

/// Acceptance policy applied across all SCTs found for a certificate
///
/// Production CT policies differ on thresholds (counts scaled by validity
/// period, operator diversity), so both knobs are configuration rather than
/// hardcoded. The default accepts one valid SCT from a usable log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CtPolicy {
    /// Minimum number of SCTs that must verify as Valid
    pub min_valid_scts: usize,
    /// Minimum number of distinct operators among the valid SCTs' logs
    pub min_distinct_operators: usize,
    /// Require a verified Merkle inclusion proof for each SCT; needs a
    /// transport and per-log URLs
    pub require_inclusion_proof: bool,
}

impl Default for CtPolicy {
    fn default() -> Self {
        Self {
            min_valid_scts: 1,
            min_distinct_operators: 1,
            require_inclusion_proof: false,
        }
    }
}
