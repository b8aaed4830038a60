//! IPDB header decoding
//!
//! The header is a 4-byte big-endian length followed by that many bytes of
//! UTF-8 JSON. Only the decoded [`Metadata`] is kept; the JSON text itself is
//! not retained.

use super::types::HEADER_LENGTH_BYTES;
use crate::address::IpVersion;
use crate::error::{IpdbError, Result};
use crate::source::ByteSource;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Database metadata decoded from the JSON header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Opaque build identifier
    pub build: u64,
    /// Supported families: bit0 = IPv4, bit1 = IPv6
    pub ip_version: u16,
    /// Number of trie nodes
    pub node_count: u32,
    /// Language code -> column where that language's field block starts
    pub languages: FxHashMap<String, usize>,
    /// Field names, in column order within one language block
    pub fields: Vec<String>,
    /// Declared body size in bytes (advisory)
    pub total_size: u64,
}

impl Metadata {
    /// Whether the database declares support for `version`
    pub fn supports(&self, version: IpVersion) -> bool {
        self.ip_version & version.mask() != 0
    }

    /// Byte length of the node array
    pub fn node_array_len(&self) -> usize {
        self.node_count as usize * super::types::NODE_BYTES
    }

    /// Column offset of a language block, if the language exists
    pub fn language_offset(&self, language: &str) -> Option<usize> {
        self.languages.get(language).copied()
    }
}

/// Decode the header at the start of `source`
///
/// Returns the metadata and the offset of the first byte after the header,
/// which is where the node array begins.
pub fn decode_header<B: ByteSource + ?Sized>(source: &B) -> Result<(Metadata, usize)> {
    let prefix = source.read_at(0, HEADER_LENGTH_BYTES).ok_or_else(|| {
        IpdbError::Format(format!(
            "File too small for header length: {} bytes",
            source.len()
        ))
    })?;
    let header_len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;

    let json = source
        .read_at(HEADER_LENGTH_BYTES, header_len)
        .ok_or_else(|| {
            IpdbError::Format(format!(
                "Header length {} exceeds remaining {} bytes",
                header_len,
                source.len() - HEADER_LENGTH_BYTES
            ))
        })?;

    let text = std::str::from_utf8(json)
        .map_err(|e| IpdbError::Format(format!("Header is not valid UTF-8: {}", e)))?;

    let metadata: Metadata = serde_json::from_str(text)
        .map_err(|e| IpdbError::Format(format!("Invalid header JSON: {}", e)))?;

    Ok((metadata, HEADER_LENGTH_BYTES + header_len))
}
