// ctverify - RFC 6962 Certificate Transparency verification
// Copyright (C) 2025 ctverify contributors
// Licensed under GPL-2.0

//! ctverify checks that an X.509 certificate carries sufficient Certificate
//! Transparency evidence: it extracts embedded SCTs, verifies their signatures
//! against a store of known logs, optionally validates Merkle inclusion proofs
//! fetched from the logs, and applies a configurable acceptance policy.
//!
//! The crate performs no I/O of its own; network access happens only through
//! the injected [`logclient::LogTransport`] collaborator.

pub mod certificates;
pub mod error;
pub mod logclient;
pub mod merkle;
pub mod model;
pub mod policy;
pub mod serialization;

// Re-export commonly used types
pub use crate::error::CtError;
pub use crate::model::SignedCertificateTimestamp;
pub use crate::policy::{
    CertificateVerificationResult, CtPolicy, CtVerifier, LogInfo, LogState, LogStore,
    SctVerificationResult, Verdict,
};

/// Result type for ctverify operations
pub type Result<T> = std::result::Result<T, CtError>;
