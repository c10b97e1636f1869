// Serializer for CT binary structures and canonical signed-data inputs
//
// SCT and STH signatures are computed over re-serialized structures, not over
// the encoded bytes that arrived on the wire; the builders here produce those
// canonical byte sequences bit-exactly (RFC 6962 §3.2, §3.5).

use super::*;
use crate::error::CtError;
use crate::model::{
    DigitallySigned, MerkleLeafData, MerkleTreeLeaf, SignatureType, SignedCertificateTimestamp,
    SignedEntry, SignedTreeHead, TimestampedEntry, Version,
};
use crate::Result;

/// Append a fixed-width big-endian unsigned integer (width 1..=8)
pub fn write_uint(out: &mut Vec<u8>, value: u64, width: usize) -> Result<()> {
    debug_assert!((1..=8).contains(&width));
    if width < 8 && value >> (width * 8) != 0 {
        return Err(CtError::internal(format!(
            "Value {} does not fit in {} byte(s)",
            value, width
        )));
    }
    out.extend_from_slice(&value.to_be_bytes()[8 - width..]);
    Ok(())
}

/// Append a blob preceded by a `prefix_width`-byte big-endian length
pub fn write_variable(out: &mut Vec<u8>, bytes: &[u8], prefix_width: usize) -> Result<()> {
    write_uint(out, bytes.len() as u64, prefix_width)?;
    out.extend_from_slice(bytes);
    Ok(())
}

/// Encode a TLS `digitally-signed` element
pub fn encode_digitally_signed(signed: &DigitallySigned) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(4 + signed.signature.len());
    write_uint(&mut out, u64::from(signed.hash_algorithm.number()), ALGORITHM_LENGTH)?;
    write_uint(
        &mut out,
        u64::from(signed.signature_algorithm.number()),
        ALGORITHM_LENGTH,
    )?;
    write_variable(&mut out, &signed.signature, SIGNATURE_PREFIX_LENGTH)?;
    Ok(out)
}

/// Encode an SCT to its TLS wire format
pub fn encode_sct(sct: &SignedCertificateTimestamp) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_uint(&mut out, u64::from(sct.version.number()), VERSION_LENGTH)?;
    out.extend_from_slice(sct.id.as_bytes());
    write_uint(&mut out, sct.timestamp, TIMESTAMP_LENGTH)?;
    write_variable(&mut out, &sct.extensions, EXTENSIONS_PREFIX_LENGTH)?;
    out.extend_from_slice(&encode_digitally_signed(&sct.signature)?);
    Ok(out)
}

fn write_signed_entry(out: &mut Vec<u8>, entry: &SignedEntry) -> Result<()> {
    match entry {
        SignedEntry::X509 { certificate } => {
            write_uint(out, 0, LOG_ENTRY_TYPE_LENGTH)?;
            write_variable(out, certificate, CERTIFICATE_PREFIX_LENGTH)?;
        }
        SignedEntry::Precert {
            issuer_key_hash,
            tbs_certificate,
        } => {
            write_uint(out, 1, LOG_ENTRY_TYPE_LENGTH)?;
            out.extend_from_slice(issuer_key_hash);
            write_variable(out, tbs_certificate, CERTIFICATE_PREFIX_LENGTH)?;
        }
        SignedEntry::Unknown { entry_type, .. } => {
            return Err(CtError::internal(format!(
                "Cannot serialize entry of unrecognized type {}",
                entry_type
            )));
        }
    }
    Ok(())
}

fn sct_signed_data(
    sct: &SignedCertificateTimestamp,
    signed_entry: &SignedEntry,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_uint(&mut out, u64::from(sct.version.number()), VERSION_LENGTH)?;
    write_uint(
        &mut out,
        u64::from(SignatureType::CertificateTimestamp.number()),
        VERSION_LENGTH,
    )?;
    write_uint(&mut out, sct.timestamp, TIMESTAMP_LENGTH)?;
    write_signed_entry(&mut out, signed_entry)?;
    write_variable(&mut out, &sct.extensions, EXTENSIONS_PREFIX_LENGTH)?;
    Ok(out)
}

/// Canonical byte sequence the log signed for an X509Entry SCT
pub fn sct_signed_data_x509(
    sct: &SignedCertificateTimestamp,
    certificate: &[u8],
) -> Result<Vec<u8>> {
    sct_signed_data(
        sct,
        &SignedEntry::X509 {
            certificate: certificate.to_vec(),
        },
    )
}

/// Canonical byte sequence the log signed for a PrecertEntry SCT
pub fn sct_signed_data_precert(
    sct: &SignedCertificateTimestamp,
    issuer_key_hash: [u8; 32],
    tbs_certificate: &[u8],
) -> Result<Vec<u8>> {
    sct_signed_data(
        sct,
        &SignedEntry::Precert {
            issuer_key_hash,
            tbs_certificate: tbs_certificate.to_vec(),
        },
    )
}

/// Canonical byte sequence a log signs in a tree head (RFC 6962 §3.5)
pub fn sth_signed_data(sth: &SignedTreeHead) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(2 + TIMESTAMP_LENGTH + TREE_SIZE_LENGTH + 32);
    write_uint(&mut out, u64::from(Version::V1.number()), VERSION_LENGTH)?;
    write_uint(
        &mut out,
        u64::from(SignatureType::TreeHash.number()),
        VERSION_LENGTH,
    )?;
    write_uint(&mut out, sth.timestamp, TIMESTAMP_LENGTH)?;
    write_uint(&mut out, sth.tree_size, TREE_SIZE_LENGTH)?;
    out.extend_from_slice(&sth.sha256_root_hash);
    Ok(out)
}

fn encode_timestamped_entry(out: &mut Vec<u8>, entry: &TimestampedEntry) -> Result<()> {
    write_uint(out, entry.timestamp, TIMESTAMP_LENGTH)?;
    write_signed_entry(out, &entry.signed_entry)?;
    write_variable(out, &entry.extensions, EXTENSIONS_PREFIX_LENGTH)?;
    Ok(())
}

/// Encode a MerkleTreeLeaf; these bytes, prefixed with 0x00, are the leaf
/// hash input for inclusion proofs
pub fn encode_merkle_tree_leaf(leaf: &MerkleTreeLeaf) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_uint(&mut out, u64::from(leaf.version.number()), VERSION_LENGTH)?;
    match &leaf.data {
        MerkleLeafData::TimestampedEntry(entry) => {
            write_uint(&mut out, 0, LEAF_TYPE_LENGTH)?;
            encode_timestamped_entry(&mut out, entry)?;
        }
        MerkleLeafData::Unknown { leaf_type, data } => {
            write_uint(&mut out, u64::from(*leaf_type), LEAF_TYPE_LENGTH)?;
            out.extend_from_slice(data);
        }
    }
    Ok(out)
}
