// TLS-style binary codec for CT structures
//
// RFC 6962 reuses the TLS presentation language: fixed-width big-endian
// integers, length-prefixed opaque blobs (prefix width declared per field),
// and structures that must consume their input exactly. Decoding is
// streaming: no over-read, and trailing bytes are an error.

pub mod deserializer;
pub mod serializer;

pub use deserializer::{
    parse_digitally_signed, parse_log_entry, parse_merkle_tree_leaf, parse_sct, parse_sct_list,
    BinaryReader,
};
pub use serializer::{
    encode_digitally_signed, encode_merkle_tree_leaf, encode_sct, sct_signed_data_precert,
    sct_signed_data_x509, sth_signed_data,
};

/// Width of the SCT version field
pub const VERSION_LENGTH: usize = 1;
/// Width of the timestamp field
pub const TIMESTAMP_LENGTH: usize = 8;
/// Width of the MerkleLeafType field
pub const LEAF_TYPE_LENGTH: usize = 1;
/// Width of the LogEntryType field
pub const LOG_ENTRY_TYPE_LENGTH: usize = 2;
/// Width of the hash/signature algorithm fields
pub const ALGORITHM_LENGTH: usize = 1;
/// Length-prefix width for CtExtensions
pub const EXTENSIONS_PREFIX_LENGTH: usize = 2;
/// Length-prefix width for signature bytes inside digitally-signed
pub const SIGNATURE_PREFIX_LENGTH: usize = 2;
/// Length-prefix width for an ASN.1Cert / TBSCertificate blob
pub const CERTIFICATE_PREFIX_LENGTH: usize = 3;
/// Length-prefix width for a certificate chain
pub const CHAIN_PREFIX_LENGTH: usize = 3;
/// Length-prefix width for the SerializedSCT list and each list element
pub const SCT_LIST_PREFIX_LENGTH: usize = 2;
/// Width of the tree size field in tree-head signature input
pub const TREE_SIZE_LENGTH: usize = 8;
