// CT data model - RFC 6962 wire structures as immutable data holders
//
// These types are produced only by the binary codec in `serialization` or by
// the JSON envelope parsers in `logclient`; nothing here knows how to decode
// or verify itself.

use serde::{Deserialize, Serialize};

/// SHA-256 output size, used for log IDs, issuer key hashes and tree nodes
pub const HASH_SIZE: usize = 32;

/// A CT log's identity: the SHA-256 hash of its public key (RFC 6962 §3.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogId(pub [u8; HASH_SIZE]);

impl LogId {
    /// Build a LogId from a byte slice, which must be exactly 32 bytes
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        let arr: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| {
            crate::CtError::malformed(format!(
                "Log ID must be {} bytes, got {}",
                HASH_SIZE,
                bytes.len()
            ))
        })?;
        Ok(LogId(arr))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

/// Protocol version of an SCT or tree head (RFC 6962 §3.2)
///
/// A compliant v1 client MUST NOT construe an unrecognized version as an
/// error; such structures stay partially opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Version {
    V1,
    Unknown(u8),
}

impl Version {
    pub fn from_number(number: u8) -> Self {
        match number {
            0 => Version::V1,
            n => Version::Unknown(n),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Version::V1 => 0,
            Version::Unknown(n) => *n,
        }
    }
}

/// TLS HashAlgorithm registry (RFC 5246 §7.4.1.4.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    None,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Unknown(u8),
}

impl HashAlgorithm {
    pub fn from_number(number: u8) -> Self {
        match number {
            0 => HashAlgorithm::None,
            1 => HashAlgorithm::Md5,
            2 => HashAlgorithm::Sha1,
            3 => HashAlgorithm::Sha224,
            4 => HashAlgorithm::Sha256,
            5 => HashAlgorithm::Sha384,
            6 => HashAlgorithm::Sha512,
            n => HashAlgorithm::Unknown(n),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            HashAlgorithm::None => 0,
            HashAlgorithm::Md5 => 1,
            HashAlgorithm::Sha1 => 2,
            HashAlgorithm::Sha224 => 3,
            HashAlgorithm::Sha256 => 4,
            HashAlgorithm::Sha384 => 5,
            HashAlgorithm::Sha512 => 6,
            HashAlgorithm::Unknown(n) => *n,
        }
    }
}

/// TLS SignatureAlgorithm registry (RFC 5246 §7.4.1.4.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    Anonymous,
    Rsa,
    Dsa,
    Ecdsa,
    Unknown(u8),
}

impl SignatureAlgorithm {
    pub fn from_number(number: u8) -> Self {
        match number {
            0 => SignatureAlgorithm::Anonymous,
            1 => SignatureAlgorithm::Rsa,
            2 => SignatureAlgorithm::Dsa,
            3 => SignatureAlgorithm::Ecdsa,
            n => SignatureAlgorithm::Unknown(n),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            SignatureAlgorithm::Anonymous => 0,
            SignatureAlgorithm::Rsa => 1,
            SignatureAlgorithm::Dsa => 2,
            SignatureAlgorithm::Ecdsa => 3,
            SignatureAlgorithm::Unknown(n) => *n,
        }
    }
}

/// A TLS `digitally-signed` element: algorithm pair plus raw signature bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitallySigned {
    pub hash_algorithm: HashAlgorithm,
    pub signature_algorithm: SignatureAlgorithm,
    pub signature: Vec<u8>,
}

/// Signature type discriminator inside CT signed structures (RFC 6962 §3.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureType {
    CertificateTimestamp,
    TreeHash,
}

impl SignatureType {
    pub fn number(&self) -> u8 {
        match self {
            SignatureType::CertificateTimestamp => 0,
            SignatureType::TreeHash => 1,
        }
    }
}

/// A log's promise to include a certificate (RFC 6962 §3.2)
///
/// The signature covers a canonical re-serialization of (version,
/// signature-type, timestamp, entry-type, leaf payload, extensions), NOT the
/// raw encoded SCT bytes. See `serialization::serializer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCertificateTimestamp {
    pub version: Version,
    pub id: LogId,
    /// Epoch milliseconds at which the log issued the SCT
    pub timestamp: u64,
    /// Opaque extension bytes; empty for every log deployed today
    pub extensions: Vec<u8>,
    pub signature: DigitallySigned,
}

/// MerkleLeafType discriminator (RFC 6962 §3.4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MerkleLeafType {
    TimestampedEntry,
    Unknown(u8),
}

impl MerkleLeafType {
    pub fn from_number(number: u8) -> Self {
        match number {
            0 => MerkleLeafType::TimestampedEntry,
            n => MerkleLeafType::Unknown(n),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            MerkleLeafType::TimestampedEntry => 0,
            MerkleLeafType::Unknown(n) => *n,
        }
    }
}

/// LogEntryType discriminator (RFC 6962 §3.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEntryType {
    X509Entry,
    PrecertEntry,
    Unknown(u16),
}

impl LogEntryType {
    pub fn from_number(number: u16) -> Self {
        match number {
            0 => LogEntryType::X509Entry,
            1 => LogEntryType::PrecertEntry,
            n => LogEntryType::Unknown(n),
        }
    }

    pub fn number(&self) -> u16 {
        match self {
            LogEntryType::X509Entry => 0,
            LogEntryType::PrecertEntry => 1,
            LogEntryType::Unknown(n) => *n,
        }
    }
}

/// The entry payload signed by the log and hashed into the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedEntry {
    /// DER-encoded end-entity certificate
    X509 { certificate: Vec<u8> },
    /// SHA-256 of the issuer's SubjectPublicKeyInfo plus the defanged TBS
    Precert {
        issuer_key_hash: [u8; HASH_SIZE],
        tbs_certificate: Vec<u8>,
    },
    /// Unrecognized entry type; the remaining leaf bytes are kept opaque so
    /// the leaf can still participate in tree hashing
    Unknown { entry_type: u16, data: Vec<u8> },
}

/// TimestampedEntry (RFC 6962 §3.4)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedEntry {
    /// Epoch milliseconds
    pub timestamp: u64,
    pub signed_entry: SignedEntry,
    pub extensions: Vec<u8>,
}

/// Leaf payload variants: parsed when recognized, opaque otherwise
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MerkleLeafData {
    TimestampedEntry(TimestampedEntry),
    /// Unrecognized MerkleLeafType; bytes after the type field kept verbatim
    Unknown { leaf_type: u8, data: Vec<u8> },
}

/// MerkleTreeLeaf (RFC 6962 §3.4); the exact serialized byte layout of this
/// structure, prefixed with 0x00, is the tree's leaf hash input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTreeLeaf {
    pub version: Version,
    pub data: MerkleLeafData,
}

/// The unsigned extra_data accompanying a leaf in a get-entries response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// For X509Entry leaves: the CA chain that validates the leaf certificate
    X509Chain { certificate_chain: Vec<Vec<u8>> },
    /// For PrecertEntry leaves: the submitted precertificate plus its chain
    PrecertChain {
        pre_certificate: Vec<u8>,
        precertificate_chain: Vec<Vec<u8>>,
    },
    /// Unrecognized leaves carry their extra_data verbatim
    Unknown { data: Vec<u8> },
}

/// A leaf paired with its chain bytes, for independent re-verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLogEntry {
    pub leaf: MerkleTreeLeaf,
    pub log_entry: LogEntry,
}

/// A log's signed statement of its current tree root and size (RFC 6962 §3.5)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTreeHead {
    pub tree_size: u64,
    /// Epoch milliseconds
    pub timestamp: u64,
    pub sha256_root_hash: [u8; HASH_SIZE],
    pub signature: DigitallySigned,
}

/// Merkle audit path proving a leaf is present in a tree (RFC 6962 §2.1.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
    pub leaf_index: u64,
    pub tree_size: u64,
    pub audit_path: Vec<[u8; HASH_SIZE]>,
}

/// Proof that one tree snapshot extends an earlier one (RFC 6962 §2.1.2)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyProof {
    pub first_tree_size: u64,
    pub second_tree_size: u64,
    pub path: Vec<[u8; HASH_SIZE]>,
}
