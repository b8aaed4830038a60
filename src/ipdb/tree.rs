//! IPDB Search Tree Traversal
//!
//! Every node holds two 32-bit child pointers. A pointer `<= node_count`
//! names another node; anything larger is a leaf token that encodes the
//! location of a record in the data segment.
//!
//! Descent consumes one address bit per step, most significant bit first, and
//! stops as soon as it holds a leaf token. Shorter prefixes therefore
//! terminate early, which is how CIDR aggregation is expressed in the trie.

use super::format::Metadata;
use super::types::{NodeRecord, NODE_BYTES, V4_PREFIX_BITS, V4_PREFIX_ZERO_BITS};
use crate::error::{IpdbError, Result};
use crate::source::ByteSource;
use zerocopy::FromBytes;

/// Read one child pointer of `node`
///
/// `body` is the database with the header stripped, so node `i` lives at
/// byte `i * 8`.
#[inline]
pub fn read_node<B: ByteSource + ?Sized>(body: &B, node: u32, bit: u8) -> Result<u32> {
    let offset = (node as usize)
        .checked_mul(NODE_BYTES)
        .ok_or_else(|| IpdbError::Corruption(format!("Node index {} overflows", node)))?;
    let bytes = body.read_at(offset, NODE_BYTES).ok_or_else(|| {
        IpdbError::Corruption(format!(
            "Node {} at offset {} lies outside the {}-byte body",
            node,
            offset,
            body.len()
        ))
    })?;
    let (record, _) = NodeRecord::read_from_prefix(bytes)
        .map_err(|_| IpdbError::Corruption(format!("Node {} is truncated", node)))?;
    Ok(record.child(bit))
}

/// Find the node below the shared `::ffff:0:0/96` prefix
///
/// The walk takes child 0 for the first 80 steps and child 1 for the next 16.
/// It stops early once the reached value is no longer a node index below
/// `node_count`, which happens for short or malformed tries.
pub fn compute_v4_offset<B: ByteSource + ?Sized>(body: &B, metadata: &Metadata) -> Result<u32> {
    let mut node = 0u32;
    for step in 0..V4_PREFIX_BITS {
        if node >= metadata.node_count {
            break;
        }
        let bit = if step >= V4_PREFIX_ZERO_BITS { 1 } else { 0 };
        node = read_node(body, node, bit)?;
    }
    Ok(node)
}

/// Walk the trie along `address` (big-endian bytes) starting at `start`
///
/// Returns `Ok(Some(token))` when a leaf token is reached and `Ok(None)` when
/// all bits are consumed while still on an internal node.
pub fn descend<B: ByteSource + ?Sized>(
    body: &B,
    metadata: &Metadata,
    address: &[u8],
    start: u32,
) -> Result<Option<u32>> {
    let node_count = metadata.node_count;
    let mut node = start;

    for i in 0..address.len() * 8 {
        if node > node_count {
            return Ok(Some(node));
        }
        let bit = (address[i / 8] >> (7 - (i % 8))) & 1;
        node = read_node(body, node, bit)?;
    }

    if node > node_count {
        Ok(Some(node))
    } else {
        Ok(None)
    }
}
