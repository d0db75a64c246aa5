//! Hashing helpers shared by proof construction and verification.

use sha2::{Digest, Sha256};

/// `sha256(data)` as lowercase hex — the wire encoding used throughout
/// the proof payloads (§6: "Hex is lowercase; hash widths are 64 hex
/// characters unless stated").
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Merkle root of a list of leaf strings (§4.4).
///
/// Each leaf is hashed individually; adjacent hashes are paired and
/// combined as `sha256(left_hex || right_hex)`, duplicating the last
/// hash at any level with an odd count. The empty list hashes as
/// `sha256("empty")`.
#[must_use]
pub fn merkle_root(leaves: &[String]) -> String {
    if leaves.is_empty() {
        return sha256_hex(b"empty");
    }

    let mut level: Vec<String> = leaves.iter().map(|leaf| sha256_hex(leaf.as_bytes())).collect();

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            let last = level.last().expect("level is non-empty").clone();
            level.push(last);
        }

        level = level
            .chunks_exact(2)
            .map(|pair| sha256_hex(format!("{}{}", pair[0], pair[1]).as_bytes()))
            .collect();
    }

    level.into_iter().next().expect("level reduces to exactly one root")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_hashes_as_empty_sentinel() {
        assert_eq!(merkle_root(&[]), sha256_hex(b"empty"));
    }

    #[test]
    fn single_leaf_root_is_its_own_hash() {
        let leaf = "content-hash-1".to_string();
        assert_eq!(merkle_root(std::slice::from_ref(&leaf)), sha256_hex(leaf.as_bytes()));
    }

    #[test]
    fn odd_count_duplicates_last_leaf() {
        let leaves = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let root = merkle_root(&leaves);

        let h = |s: &str| sha256_hex(s.as_bytes());
        let ab = sha256_hex(format!("{}{}", h("a"), h("b")).as_bytes());
        let cc = sha256_hex(format!("{}{}", h("c"), h("c")).as_bytes());
        let expected = sha256_hex(format!("{ab}{cc}").as_bytes());

        assert_eq!(root, expected);
    }

    #[test]
    fn root_is_64_hex_chars() {
        let leaves = vec!["x".to_string(), "y".to_string()];
        assert_eq!(merkle_root(&leaves).len(), 64);
    }

    #[test]
    fn deterministic_for_same_input() {
        let leaves = vec!["1".to_string(), "2".to_string(), "3".to_string(), "4".to_string()];
        assert_eq!(merkle_root(&leaves), merkle_root(&leaves));
    }

    #[test]
    fn order_matters() {
        let a = vec!["1".to_string(), "2".to_string()];
        let b = vec!["2".to_string(), "1".to_string()];
        assert_ne!(merkle_root(&a), merkle_root(&b));
    }
}
