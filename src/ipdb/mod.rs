//! IPDB binary format reader
//!
//! An IPDB file is laid out as:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ u32 BE header length L                        │
//! │ L bytes of UTF-8 JSON header (Metadata)       │
//! ├───────────────────────────────────────────────┤  <- body starts here
//! │ node_count × 8 bytes: [u32 BE child0, child1] │
//! │ data segment: (u16 BE length S, S bytes)*     │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! All node and record offsets are relative to the start of the body.
//!
//! ## Architecture
//!
//! - **types**: on-disk constants and the node record layout
//! - **format**: header decoding into [`Metadata`]
//! - **tree**: v4offset computation and bit-by-bit trie descent
//! - **record**: leaf token to record payload resolution

pub mod format;
pub mod record;
pub mod tree;
pub mod types;

pub use format::{decode_header, Metadata};
pub use record::resolve;
pub use tree::{compute_v4_offset, descend, read_node};
