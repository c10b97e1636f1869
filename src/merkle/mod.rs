// Merkle Hash Tree algorithms (RFC 6962 §2.1)
//
// Leaf and interior node hashes are domain-separated: a leaf hashes as
// SHA256(0x00 || leaf), an interior node as SHA256(0x01 || left || right).
// The empty tree has a defined root, SHA256 of the empty string.

pub mod verifier;

pub use verifier::{verify_consistency, verify_inclusion};

use sha2::{Digest, Sha256};

/// Domain separation prefix for leaf hashes
pub const LEAF_HASH_PREFIX: u8 = 0x00;
/// Domain separation prefix for interior node hashes
pub const NODE_HASH_PREFIX: u8 = 0x01;

/// Hash of the empty tree: SHA256 of zero bytes
pub fn empty_tree_root() -> [u8; 32] {
    Sha256::digest([]).into()
}

/// Leaf hash: SHA256(0x00 || leaf_bytes)
pub fn leaf_hash(leaf_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_HASH_PREFIX]);
    hasher.update(leaf_bytes);
    hasher.finalize().into()
}

/// Interior node hash: SHA256(0x01 || left || right)
pub fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_HASH_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
