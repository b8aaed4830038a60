//! IPDB - Reader for IPIP.net binary IP geolocation databases
//!
//! An IPDB file maps every IPv4 or IPv6 address to a record of
//! tab-separated strings, with one block of values per language. This crate
//! loads such a file (memory-mapped or owned), descends its binary trie and
//! slices records by language.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ipdb::{FullInfoParser, Reader};
//! use std::net::Ipv4Addr;
//!
//! let reader = Reader::open("city.free.ipdb")?;
//! println!("languages: {:?}, fields: {:?}", reader.languages(), reader.fields());
//!
//! // Ordered values of one language block
//! if let Some(values) = reader.find(Ipv4Addr::new(1, 1, 1, 1), "CN")? {
//!     println!("{}", values.join("\t"));
//! }
//!
//! // Named fields
//! if let Some(info) = reader.find_then_parse_pairs(&FullInfoParser, "8.8.8.8".parse::<std::net::IpAddr>()?, "CN")? {
//!     println!("{} / {}", info.country_name, info.city_name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # File Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  u32 BE header length L              │
//! │  L bytes of JSON metadata            │
//! ├──────────────────────────────────────┤  <- body
//! │  node_count × 8 byte trie nodes      │
//! │  records: u16 BE length + UTF-8      │
//! └──────────────────────────────────────┘
//! ```
//!
//! A loaded [`Reader`] is immutable. It is `Send + Sync` and can be shared
//! across threads (e.g. behind an `Arc`) without locking.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// IPv4/IPv6 address values accepted by lookups
pub mod address;
/// Database loading and lookups
pub mod database;
/// Error types for IPDB operations
pub mod error;
pub mod file_reader;
/// IPDB on-disk format (internal)
mod ipdb;
pub mod mmap;
pub mod parser;
/// Byte buffers a database can live in
pub mod source;
pub mod validation;

// Re-exports for Rust consumers

/// Loaded database
pub use crate::database::Reader;

pub use crate::address::{Address, IpVersion};
pub use crate::error::{IpdbError, Result};
pub use crate::ipdb::Metadata;
pub use crate::parser::{FullInfo, FullInfoParser, OrderParser, PairParser};
pub use crate::validation::{ValidationLevel, ValidationReport};

/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
