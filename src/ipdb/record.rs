//! Record resolution
//!
//! A leaf token `t` maps to body offset `t - node_count + node_count * 8`.
//! At that offset sits a big-endian `u16` length `S` followed by `S` bytes of
//! UTF-8 holding every language block, tab-separated.

use super::format::Metadata;
use super::types::{LENGTH_PREFIX_BYTES, NODE_BYTES};
use crate::error::{IpdbError, Result};
use crate::source::ByteSource;

/// Translate a leaf token into an absolute body offset
///
/// Fails with `Corruption` if `token` is not a leaf token or the arithmetic
/// overflows.
#[inline]
pub fn resolved_offset(metadata: &Metadata, token: u32) -> Result<usize> {
    let node_count = metadata.node_count as u64;
    let relative = (token as u64).checked_sub(node_count).ok_or_else(|| {
        IpdbError::Corruption(format!(
            "Token {} is not a leaf (node_count = {})",
            token, node_count
        ))
    })?;
    let offset = node_count * NODE_BYTES as u64 + relative;
    usize::try_from(offset)
        .map_err(|_| IpdbError::Corruption(format!("Record offset {} overflows", offset)))
}

/// Decode the record payload a leaf token points at
///
/// The returned text borrows from `body`.
pub fn resolve<'a, B: ByteSource + ?Sized>(
    body: &'a B,
    metadata: &Metadata,
    token: u32,
) -> Result<&'a str> {
    let offset = resolved_offset(metadata, token)?;
    let len = body.len();
    if offset >= len {
        return Err(IpdbError::Corruption(format!(
            "Resolved offset {} is past the end of the {}-byte body",
            offset, len
        )));
    }

    let prefix = body.read_at(offset, LENGTH_PREFIX_BYTES).ok_or_else(|| {
        IpdbError::Corruption(format!(
            "Record length prefix at {} is cut off by the end of the body",
            offset
        ))
    })?;
    let size = u16::from_be_bytes([prefix[0], prefix[1]]) as usize;

    let payload = body
        .read_at(offset + LENGTH_PREFIX_BYTES, size)
        .ok_or_else(|| {
            IpdbError::Corruption(format!(
                "Record at {} with length {} exceeds the {}-byte body",
                offset, size, len
            ))
        })?;

    std::str::from_utf8(payload).map_err(|e| {
        IpdbError::Format(format!("Record at {} is not valid UTF-8: {}", offset, e))
    })
}
