//! Tests for inclusion proof construction and verification.

use strata_types::{Digest, Root};

use super::{leaf, tree_of};
use crate::error::MerkleError;

#[test]
fn test_single_leaf_proof_is_empty() {
    let index = tree_of(1);
    let proof = index.inclusion_proof(0, 1).unwrap();
    assert!(proof.path.is_empty());
    proof.verify(&leaf(0), &index.root()).unwrap();
}

#[test]
fn test_every_leaf_verifies_under_every_size() {
    let index = tree_of(40);

    for size in 1..=40u64 {
        let root = index.root_at(size).unwrap();
        for i in 0..size {
            let proof = index.inclusion_proof(i, size).unwrap();
            proof
                .verify(&leaf(i), &root)
                .unwrap_or_else(|e| panic!("leaf {i} size {size}: {e}"));
        }
    }
}

#[test]
fn test_index_equal_to_size_is_invalid_size() {
    let index = tree_of(5);
    let err = index.inclusion_proof(5, 5).unwrap_err();
    assert_eq!(err, MerkleError::IndexOutOfRange { index: 5, size: 5 });
    assert!(err.to_string().starts_with("invalid tree size"));
}

#[test]
fn test_size_beyond_tree_is_invalid() {
    let index = tree_of(5);
    assert!(matches!(
        index.inclusion_proof(0, 6),
        Err(MerkleError::InvalidSize { size: 6, current: 5 })
    ));
}

#[test]
fn test_wrong_leaf_fails() {
    let index = tree_of(9);
    let proof = index.inclusion_proof(4, 9).unwrap();
    let err = proof.verify(&leaf(5), &index.root()).unwrap_err();
    assert!(matches!(err, MerkleError::ProofVerification { .. }));
}

#[test]
fn test_wrong_root_fails() {
    let index = tree_of(9);
    let proof = index.inclusion_proof(4, 9).unwrap();
    let forged = Root {
        size: 9,
        hash: Digest::from([0u8; 32]),
    };
    assert!(proof.verify(&leaf(4), &forged).is_err());
}

#[test]
fn test_root_of_other_size_fails() {
    let index = tree_of(9);
    let proof = index.inclusion_proof(4, 9).unwrap();
    assert!(proof.verify(&leaf(4), &index.root_at(8).unwrap()).is_err());
}

#[test]
fn test_tampered_path_fails() {
    let index = tree_of(12);
    let mut proof = index.inclusion_proof(3, 12).unwrap();
    let mut raw = *proof.path[1].as_bytes();
    raw[0] ^= 0x01;
    proof.path[1] = Digest::from(raw);
    assert!(proof.verify(&leaf(3), &index.root()).is_err());
}

#[test]
fn test_truncated_and_padded_paths_fail() {
    let index = tree_of(12);
    let proof = index.inclusion_proof(3, 12).unwrap();

    let mut short = proof.clone();
    short.path.pop();
    assert!(short.verify(&leaf(3), &index.root()).is_err());

    let mut long = proof;
    long.path.push(leaf(0));
    assert!(long.verify(&leaf(3), &index.root()).is_err());
}

#[test]
fn test_out_of_range_index_in_proof_fails() {
    let index = tree_of(4);
    let mut proof = index.inclusion_proof(3, 4).unwrap();
    proof.leaf_index = 4;
    assert!(proof.verify(&leaf(3), &index.root()).is_err());
}
