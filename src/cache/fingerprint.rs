//! Fingerprint Calculator
//!
//! blake3 over a tagged, length-prefixed encoding of a node's structural
//! fields and its descendant snapshot. Snapshot maps are ordered, so the
//! encoding is canonical without sorting.

use crate::cache::record::DescendantSnapshot;
use crate::store::Node;
use blake3::Hasher;

const DOMAIN: &[u8] = b"canopy:fingerprint:v1";

/// Compute the fingerprint of `node` with the given snapshot, as lowercase hex
pub fn compute_fingerprint(node: &Node, snapshot: &DescendantSnapshot) -> String {
    let mut hasher = Hasher::new();
    hasher.update(DOMAIN);
    match node.parent {
        Some(parent) => {
            hasher.update(&[1]);
            hasher.update(&parent.to_be_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
    write_fields(
        &mut hasher,
        &node.alias,
        &node.title,
        node.position,
        node.published,
    );
    write_snapshot(&mut hasher, snapshot);
    hex::encode(hasher.finalize().as_bytes())
}

fn write_str(hasher: &mut Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

fn write_fields(hasher: &mut Hasher, alias: &str, title: &str, position: i64, published: bool) {
    write_str(hasher, alias);
    write_str(hasher, title);
    hasher.update(&position.to_be_bytes());
    hasher.update(&[published as u8]);
}

fn write_snapshot(hasher: &mut Hasher, snapshot: &DescendantSnapshot) {
    hasher.update(b"{");
    hasher.update(&(snapshot.len() as u64).to_be_bytes());
    for (id, entry) in snapshot.iter() {
        hasher.update(&id.to_be_bytes());
        write_fields(
            hasher,
            &entry.alias,
            &entry.title,
            entry.position,
            entry.published,
        );
        write_snapshot(hasher, &entry.children);
    }
    hasher.update(b"}");
}
