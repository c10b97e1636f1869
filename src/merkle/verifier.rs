// Inclusion and consistency proof verification (RFC 6962 §2.1, RFC 9162 §2.1.3-4)
//
// Verification returns a plain bool: any structural defect (wrong path
// length, index out of range) or hash mismatch is a failed proof, never a
// partial match. Mapping a failure to PROOF_FAILED happens at policy level.

use super::{leaf_hash, node_hash};

/// Recompute the root implied by an audit path. Returns None when the path
/// is structurally invalid: index out of range, too few or too many siblings.
fn root_from_inclusion_proof(
    leaf_hash: &[u8; 32],
    leaf_index: u64,
    tree_size: u64,
    audit_path: &[[u8; 32]],
) -> Option<[u8; 32]> {
    if leaf_index >= tree_size {
        return None;
    }

    let mut fn_ = leaf_index;
    let mut sn = tree_size - 1;
    let mut hash = *leaf_hash;

    for sibling in audit_path {
        if sn == 0 {
            // proof has leftover elements
            return None;
        }
        if fn_ & 1 == 1 || fn_ == sn {
            hash = node_hash(sibling, &hash);
            if fn_ & 1 == 0 {
                // right-most node at this level; skip to the next level
                // that has a left sibling
                while fn_ & 1 == 0 && fn_ != 0 {
                    fn_ >>= 1;
                    sn >>= 1;
                }
            }
        } else {
            hash = node_hash(&hash, sibling);
        }
        fn_ >>= 1;
        sn >>= 1;
    }

    if sn != 0 {
        // proof is missing elements
        return None;
    }
    Some(hash)
}

/// Verify that `leaf_bytes` is the leaf at `leaf_index` in a tree of
/// `tree_size` leaves with the given root hash
pub fn verify_inclusion(
    leaf_bytes: &[u8],
    leaf_index: u64,
    tree_size: u64,
    audit_path: &[[u8; 32]],
    root: &[u8; 32],
) -> bool {
    verify_inclusion_of_hash(&leaf_hash(leaf_bytes), leaf_index, tree_size, audit_path, root)
}

/// Like [`verify_inclusion`] but starting from an already computed leaf hash
pub fn verify_inclusion_of_hash(
    leaf_hash: &[u8; 32],
    leaf_index: u64,
    tree_size: u64,
    audit_path: &[[u8; 32]],
    root: &[u8; 32],
) -> bool {
    match root_from_inclusion_proof(leaf_hash, leaf_index, tree_size, audit_path) {
        Some(computed) => computed == *root,
        None => false,
    }
}

/// Verify that the tree with `second_root` (size `second`) is an append-only
/// extension of the tree with `first_root` (size `first`)
pub fn verify_consistency(
    first: u64,
    second: u64,
    proof: &[[u8; 32]],
    first_root: &[u8; 32],
    second_root: &[u8; 32],
) -> bool {
    if first > second {
        return false;
    }
    if first == second {
        // trivially consistent; no proof nodes allowed
        return proof.is_empty() && first_root == second_root;
    }
    if first == 0 {
        // the empty tree is a prefix of every tree
        return proof.is_empty();
    }

    // When first is an exact power of two, the old root is a node of the new
    // tree and the proof implicitly starts from it.
    let mut path = proof.iter();
    let first_hash = if first.is_power_of_two() {
        *first_root
    } else {
        match path.next() {
            Some(hash) => *hash,
            None => return false,
        }
    };

    let mut fn_ = first - 1;
    let mut sn = second - 1;
    while fn_ & 1 == 1 {
        fn_ >>= 1;
        sn >>= 1;
    }

    let mut fr = first_hash;
    let mut sr = first_hash;

    for sibling in path {
        if sn == 0 {
            return false;
        }
        if fn_ & 1 == 1 || fn_ == sn {
            fr = node_hash(sibling, &fr);
            sr = node_hash(sibling, &sr);
            if fn_ & 1 == 0 {
                while fn_ & 1 == 0 && fn_ != 0 {
                    fn_ >>= 1;
                    sn >>= 1;
                }
            }
        } else {
            sr = node_hash(&sr, sibling);
        }
        fn_ >>= 1;
        sn >>= 1;
    }

    sn == 0 && fr == *first_root && sr == *second_root
}
