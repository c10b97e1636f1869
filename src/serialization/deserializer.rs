// Streaming deserializer for CT binary structures
//
// All reads are bounds-checked against the remaining input and fail with
// `CtError::MalformedInput`. Unknown-but-well-formed enum values (version,
// leaf type, entry type) decode into `Unknown` variants, per the RFC 6962
// forward-compatibility requirement.

use super::*;
use crate::error::CtError;
use crate::model::{
    DigitallySigned, HashAlgorithm, LogEntry, LogEntryType, LogId, MerkleLeafData, MerkleLeafType,
    MerkleTreeLeaf, ParsedLogEntry, SignatureAlgorithm, SignedCertificateTimestamp, SignedEntry,
    TimestampedEntry, Version, HASH_SIZE,
};
use crate::Result;

/// Cursor over a byte slice with exact-consumption semantics
pub struct BinaryReader<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.input.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read a fixed-width big-endian unsigned integer (width 1..=8)
    pub fn read_uint(&mut self, width: usize) -> Result<u64> {
        debug_assert!((1..=8).contains(&width));
        let bytes = self.read_bytes(width)?;
        let mut value = 0u64;
        for byte in bytes {
            value = (value << 8) | u64::from(*byte);
        }
        Ok(value)
    }

    /// Read exactly `count` bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(CtError::malformed(format!(
                "Expected {} bytes at offset {}, only {} remain",
                count,
                self.position,
                self.remaining()
            )));
        }
        let slice = &self.input[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    /// Read a blob prefixed by a `prefix_width`-byte big-endian length
    pub fn read_variable(&mut self, prefix_width: usize) -> Result<&'a [u8]> {
        let declared = self.read_uint(prefix_width)? as usize;
        if declared > self.remaining() {
            return Err(CtError::malformed(format!(
                "Declared length {} exceeds remaining {} bytes",
                declared,
                self.remaining()
            )));
        }
        self.read_bytes(declared)
    }

    /// Fail unless the declared structure consumed its input exactly
    pub fn expect_end(&self, context: &str) -> Result<()> {
        if self.remaining() != 0 {
            return Err(CtError::malformed(format!(
                "{} trailing byte(s) after {}",
                self.remaining(),
                context
            )));
        }
        Ok(())
    }
}

/// Parse a TLS `digitally-signed` element from the reader's current position
pub fn parse_digitally_signed_from(reader: &mut BinaryReader<'_>) -> Result<DigitallySigned> {
    let hash_algorithm = HashAlgorithm::from_number(reader.read_uint(ALGORITHM_LENGTH)? as u8);
    let signature_algorithm =
        SignatureAlgorithm::from_number(reader.read_uint(ALGORITHM_LENGTH)? as u8);
    let signature = reader.read_variable(SIGNATURE_PREFIX_LENGTH)?.to_vec();
    Ok(DigitallySigned {
        hash_algorithm,
        signature_algorithm,
        signature,
    })
}

/// Parse a standalone `digitally-signed` element, consuming all input
pub fn parse_digitally_signed(input: &[u8]) -> Result<DigitallySigned> {
    let mut reader = BinaryReader::new(input);
    let signed = parse_digitally_signed_from(&mut reader)?;
    reader.expect_end("DigitallySigned")?;
    Ok(signed)
}

/// Parse a TLS-encoded SignedCertificateTimestamp, consuming all input
pub fn parse_sct(input: &[u8]) -> Result<SignedCertificateTimestamp> {
    let mut reader = BinaryReader::new(input);
    let version = Version::from_number(reader.read_uint(VERSION_LENGTH)? as u8);
    let id = LogId::from_bytes(reader.read_bytes(HASH_SIZE)?)?;
    let timestamp = reader.read_uint(TIMESTAMP_LENGTH)?;
    let extensions = reader.read_variable(EXTENSIONS_PREFIX_LENGTH)?.to_vec();
    let signature = parse_digitally_signed_from(&mut reader)?;
    reader.expect_end("SignedCertificateTimestamp")?;
    Ok(SignedCertificateTimestamp {
        version,
        id,
        timestamp,
        extensions,
        signature,
    })
}

/// Parse a SignedCertificateTimestampList: a 2-byte length-prefixed sequence
/// of 2-byte length-prefixed serialized SCTs (RFC 6962 §3.3)
pub fn parse_sct_list(input: &[u8]) -> Result<Vec<SignedCertificateTimestamp>> {
    let mut outer = BinaryReader::new(input);
    let list_bytes = outer.read_variable(SCT_LIST_PREFIX_LENGTH)?;
    outer.expect_end("SignedCertificateTimestampList")?;

    let mut reader = BinaryReader::new(list_bytes);
    let mut scts = Vec::new();
    while !reader.is_empty() {
        let sct_bytes = reader.read_variable(SCT_LIST_PREFIX_LENGTH)?;
        scts.push(parse_sct(sct_bytes)?);
    }
    Ok(scts)
}

fn parse_signed_entry(
    reader: &mut BinaryReader<'_>,
    entry_type: LogEntryType,
) -> Result<SignedEntry> {
    match entry_type {
        LogEntryType::X509Entry => {
            let certificate = reader.read_variable(CERTIFICATE_PREFIX_LENGTH)?.to_vec();
            Ok(SignedEntry::X509 { certificate })
        }
        LogEntryType::PrecertEntry => {
            let issuer_key_hash: [u8; HASH_SIZE] = reader
                .read_bytes(HASH_SIZE)?
                .try_into()
                .map_err(|_| CtError::internal("Fixed-width read returned wrong length"))?;
            let tbs_certificate = reader.read_variable(CERTIFICATE_PREFIX_LENGTH)?.to_vec();
            Ok(SignedEntry::Precert {
                issuer_key_hash,
                tbs_certificate,
            })
        }
        // Unrecognized entry types keep the rest of the leaf opaque so the
        // leaf can still be hashed into the tree
        LogEntryType::Unknown(n) => {
            let data = reader.read_bytes(reader.remaining())?.to_vec();
            Ok(SignedEntry::Unknown {
                entry_type: n,
                data,
            })
        }
    }
}

fn parse_timestamped_entry(reader: &mut BinaryReader<'_>) -> Result<TimestampedEntry> {
    let timestamp = reader.read_uint(TIMESTAMP_LENGTH)?;
    let entry_type = LogEntryType::from_number(reader.read_uint(LOG_ENTRY_TYPE_LENGTH)? as u16);
    let signed_entry = parse_signed_entry(reader, entry_type)?;
    let extensions = if matches!(signed_entry, SignedEntry::Unknown { .. }) {
        // extensions already swallowed into the opaque payload
        Vec::new()
    } else {
        reader.read_variable(EXTENSIONS_PREFIX_LENGTH)?.to_vec()
    };
    Ok(TimestampedEntry {
        timestamp,
        signed_entry,
        extensions,
    })
}

/// Parse a MerkleTreeLeaf structure, consuming all input
pub fn parse_merkle_tree_leaf(input: &[u8]) -> Result<MerkleTreeLeaf> {
    let mut reader = BinaryReader::new(input);
    let version = Version::from_number(reader.read_uint(VERSION_LENGTH)? as u8);
    let leaf_type = MerkleLeafType::from_number(reader.read_uint(LEAF_TYPE_LENGTH)? as u8);

    let data = match leaf_type {
        MerkleLeafType::TimestampedEntry => {
            MerkleLeafData::TimestampedEntry(parse_timestamped_entry(&mut reader)?)
        }
        MerkleLeafType::Unknown(n) => MerkleLeafData::Unknown {
            leaf_type: n,
            data: reader.read_bytes(reader.remaining())?.to_vec(),
        },
    };
    reader.expect_end("MerkleTreeLeaf")?;
    Ok(MerkleTreeLeaf { version, data })
}

fn parse_chain(reader: &mut BinaryReader<'_>) -> Result<Vec<Vec<u8>>> {
    let chain_bytes = reader.read_variable(CHAIN_PREFIX_LENGTH)?;
    let mut chain_reader = BinaryReader::new(chain_bytes);
    let mut chain = Vec::new();
    while !chain_reader.is_empty() {
        chain.push(
            chain_reader
                .read_variable(CERTIFICATE_PREFIX_LENGTH)?
                .to_vec(),
        );
    }
    Ok(chain)
}

/// Pair a decoded leaf_input with its decoded extra_data (RFC 6962 §4.6)
pub fn parse_log_entry(leaf_input: &[u8], extra_data: &[u8]) -> Result<ParsedLogEntry> {
    let leaf = parse_merkle_tree_leaf(leaf_input)?;

    let entry_type = match &leaf.data {
        MerkleLeafData::TimestampedEntry(entry) => match entry.signed_entry {
            SignedEntry::X509 { .. } => LogEntryType::X509Entry,
            SignedEntry::Precert { .. } => LogEntryType::PrecertEntry,
            SignedEntry::Unknown { entry_type, .. } => LogEntryType::Unknown(entry_type),
        },
        MerkleLeafData::Unknown { .. } => {
            return Ok(ParsedLogEntry {
                leaf,
                log_entry: LogEntry::Unknown {
                    data: extra_data.to_vec(),
                },
            })
        }
    };

    let log_entry = match entry_type {
        LogEntryType::X509Entry => {
            let mut reader = BinaryReader::new(extra_data);
            let certificate_chain = parse_chain(&mut reader)?;
            reader.expect_end("X509ChainEntry")?;
            LogEntry::X509Chain { certificate_chain }
        }
        LogEntryType::PrecertEntry => {
            let mut reader = BinaryReader::new(extra_data);
            let pre_certificate = reader.read_variable(CERTIFICATE_PREFIX_LENGTH)?.to_vec();
            let precertificate_chain = parse_chain(&mut reader)?;
            reader.expect_end("PrecertChainEntry")?;
            LogEntry::PrecertChain {
                pre_certificate,
                precertificate_chain,
            }
        }
        LogEntryType::Unknown(_) => LogEntry::Unknown {
            data: extra_data.to_vec(),
        },
    };

    Ok(ParsedLogEntry { leaf, log_entry })
}
