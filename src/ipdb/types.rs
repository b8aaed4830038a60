//! On-disk layout constants and structures

use zerocopy::byteorder::big_endian::U32;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// Size of the header length prefix
pub const HEADER_LENGTH_BYTES: usize = 4;

/// Size of a trie node: two 32-bit child pointers
pub const NODE_BYTES: usize = 8;

/// Size of the length prefix in front of each record
pub const LENGTH_PREFIX_BYTES: usize = 2;

/// Depth of the shared IPv4-mapped prefix (`::ffff:0:0/96`)
pub const V4_PREFIX_BITS: usize = 96;

/// Steps of the IPv4-mapped prefix that follow child 0; the rest follow child 1
pub const V4_PREFIX_ZERO_BITS: usize = 80;

/// Column separator inside a record payload
pub const FIELD_SEPARATOR: char = '\t';

/// One trie node as stored on disk
///
/// `children[0]` is followed for a 0 bit, `children[1]` for a 1 bit.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout, Unaligned)]
pub struct NodeRecord {
    /// Big-endian child pointers
    pub children: [U32; 2],
}

impl NodeRecord {
    /// Child pointer for the given bit (0 or 1)
    #[inline]
    pub fn child(&self, bit: u8) -> u32 {
        self.children[(bit & 1) as usize].get()
    }
}
