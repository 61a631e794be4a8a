//! # Domain Services
//!
//! Pure functions over ring configuration. No I/O, no async, no state.

use super::value_objects::{Address, NodeIndex, RootIdentity};
use sha3::{Digest, Keccak256};

/// Domain separator mixed into every node address.
pub const NODE_ADDRESS_TAG: &[u8] = b"ring-node/v1";

/// Computes keccak256 hash.
#[must_use]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Derives the address of node `index` in the ring anchored at `root`.
///
/// Address = keccak256(tag || len(root) || root || index)\[12:\]
///
/// The root length is encoded so that two different root identities can never
/// produce the same preimage for some pair of indices.
#[must_use]
pub fn derive_node_address(root: &RootIdentity, index: NodeIndex) -> Address {
    let material = root.as_bytes();
    let mut preimage = Vec::with_capacity(NODE_ADDRESS_TAG.len() + 8 + material.len() + 4);
    preimage.extend_from_slice(NODE_ADDRESS_TAG);
    preimage.extend_from_slice(&(material.len() as u64).to_be_bytes());
    preimage.extend_from_slice(material);
    preimage.extend_from_slice(&index.to_be_bytes());

    let hash = keccak256(&preimage);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::new(bytes)
}
