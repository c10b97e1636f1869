// Precertificate TBS reconstruction (RFC 6962 §3.2)
//
// An SCT for a precertificate is signed over a PreCert structure, not over
// the final certificate bytes: the TBS with the poison extension (or the
// embedded SCT list) removed, paired with the SHA-256 of the issuing CA's
// public key. When the precertificate was signed by a dedicated
// precert-signing CA, the TBS issuer must additionally be replaced with the
// subject of the true CA before signature verification. Verifying against
// the raw TBS bytes produces a guaranteed signature mismatch.

use super::der::{self, TAG_CONTEXT_0, TAG_CONTEXT_3, TAG_SEQUENCE};
use super::info::parse_certificate;
use super::is_pre_certificate_signing_cert;
use crate::error::CtError;
use crate::model::HASH_SIZE;
use crate::Result;
use sha2::{Digest, Sha256};

// DER encodings of the OID TLVs removed during reconstruction
const POISON_OID_DER: [u8; 12] = [
    0x06, 0x0A, 0x2B, 0x06, 0x01, 0x04, 0x01, 0xD6, 0x79, 0x02, 0x04, 0x03,
];
const SCT_LIST_OID_DER: [u8; 12] = [
    0x06, 0x0A, 0x2B, 0x06, 0x01, 0x04, 0x01, 0xD6, 0x79, 0x02, 0x04, 0x02,
];

/// The reconstructed PreCert payload an SCT signature covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecertEntry {
    pub issuer_key_hash: [u8; HASH_SIZE],
    pub tbs_certificate: Vec<u8>,
}

/// SHA-256 of the issuer's SubjectPublicKeyInfo DER
pub fn issuer_key_hash(issuer_der: &[u8]) -> Result<[u8; HASH_SIZE]> {
    let issuer = parse_certificate(issuer_der)?;
    Ok(Sha256::digest(issuer.tbs_certificate.subject_pki.raw).into())
}

fn is_ct_extension(extension: &der::Tlv<'_>) -> Result<bool> {
    // Extension ::= SEQUENCE { extnID OBJECT IDENTIFIER, ... }
    let children = der::read_children(extension.content)?;
    let oid = children
        .first()
        .ok_or_else(|| CtError::malformed("Empty Extension sequence"))?;
    Ok(oid.raw == POISON_OID_DER || oid.raw == SCT_LIST_OID_DER)
}

/// Remove the poison and embedded-SCT-list extensions from a TBSCertificate,
/// recomputing the enclosing lengths
pub fn strip_ct_extensions(tbs_der: &[u8]) -> Result<Vec<u8>> {
    let (outer, rest) = der::read_tlv(tbs_der)?;
    if outer.tag != TAG_SEQUENCE || !rest.is_empty() {
        return Err(CtError::malformed("TBSCertificate is not a single SEQUENCE"));
    }

    let mut new_content = Vec::with_capacity(outer.content.len());
    for child in der::read_children(outer.content)? {
        if child.tag != TAG_CONTEXT_3 {
            new_content.extend_from_slice(child.raw);
            continue;
        }

        // [3] EXPLICIT Extensions: SEQUENCE OF Extension
        let (ext_seq, inner_rest) = der::read_tlv(child.content)?;
        if ext_seq.tag != TAG_SEQUENCE || !inner_rest.is_empty() {
            return Err(CtError::malformed("Malformed TBS extensions block"));
        }
        let mut kept = Vec::with_capacity(ext_seq.content.len());
        for extension in der::read_children(ext_seq.content)? {
            if !is_ct_extension(&extension)? {
                kept.extend_from_slice(extension.raw);
            }
        }
        // DER requires Extensions to be non-empty; drop the whole [3] block
        // when nothing survives
        if !kept.is_empty() {
            let ext_seq = der::wrap(TAG_SEQUENCE, &kept);
            new_content.extend_from_slice(&der::wrap(TAG_CONTEXT_3, &ext_seq));
        }
    }

    Ok(der::wrap(TAG_SEQUENCE, &new_content))
}

/// Replace the issuer Name in a TBSCertificate with `new_issuer_der`
/// (the raw DER of the substitute Name)
pub fn replace_issuer(tbs_der: &[u8], new_issuer_der: &[u8]) -> Result<Vec<u8>> {
    let (outer, rest) = der::read_tlv(tbs_der)?;
    if outer.tag != TAG_SEQUENCE || !rest.is_empty() {
        return Err(CtError::malformed("TBSCertificate is not a single SEQUENCE"));
    }

    let children = der::read_children(outer.content)?;
    // TBS field order: [0] version (optional), serialNumber, signature,
    // issuer, validity, subject, subjectPublicKeyInfo, ...
    let issuer_index = if children.first().map(|c| c.tag) == Some(TAG_CONTEXT_0) {
        3
    } else {
        2
    };
    let issuer = children
        .get(issuer_index)
        .ok_or_else(|| CtError::malformed("TBSCertificate has no issuer field"))?;
    if issuer.tag != TAG_SEQUENCE {
        return Err(CtError::malformed("TBS issuer field is not a SEQUENCE"));
    }

    let mut new_content = Vec::with_capacity(outer.content.len());
    for (index, child) in children.iter().enumerate() {
        if index == issuer_index {
            new_content.extend_from_slice(new_issuer_der);
        } else {
            new_content.extend_from_slice(child.raw);
        }
    }
    Ok(der::wrap(TAG_SEQUENCE, &new_content))
}

/// Reconstruct the PreCert entry an embedded or precertificate SCT was
/// signed over. `chain[0]` is the precertificate or final certificate,
/// `chain[1]` its direct issuer; `chain[2]` is consulted when the direct
/// issuer is a dedicated precert-signing CA.
pub fn reconstruct_precert_entry(chain: &[Vec<u8>]) -> Result<PrecertEntry> {
    let leaf_der = chain
        .first()
        .ok_or_else(|| CtError::internal("Certificate chain is empty"))?;
    let issuer_der = chain.get(1).ok_or_else(|| {
        CtError::internal("Chain with PreCertificate or Certificate must contain issuer")
    })?;

    let leaf = parse_certificate(leaf_der)?;
    let mut tbs = strip_ct_extensions(leaf.tbs_certificate.as_ref())?;

    let signing_issuer_der = if is_pre_certificate_signing_cert(issuer_der)? {
        let true_issuer_der = chain.get(2).ok_or_else(|| {
            CtError::internal(
                "Chain with PreCertificate signed by PreCertificate Signing Cert must contain the true issuer",
            )
        })?;
        let true_issuer = parse_certificate(true_issuer_der)?;
        tbs = replace_issuer(&tbs, true_issuer.tbs_certificate.subject.as_raw())?;
        true_issuer_der
    } else {
        issuer_der
    };

    Ok(PrecertEntry {
        issuer_key_hash: issuer_key_hash(signing_issuer_der)?,
        tbs_certificate: tbs,
    })
}
