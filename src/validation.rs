//! Database validation for untrusted IPDB files
//!
//! Lookups already bounds-check everything they touch, so a damaged file can
//! never cause an out-of-bounds read. Validation goes further and walks the
//! whole node array up front, resolving every leaf token once, so damage is
//! reported before any lookup happens to hit it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ipdb::validation::{validate_file, ValidationLevel};
//!
//! let report = validate_file("city.ipdb", ValidationLevel::Strict)?;
//!
//! if report.is_valid() {
//!     println!("✓ Database is safe to use");
//! } else {
//!     for error in &report.errors {
//!         println!("  - {}", error);
//!     }
//! }
//! # Ok::<(), ipdb::IpdbError>(())
//! ```

use crate::address::IpVersion;
use crate::database::Reader;
use crate::error::{IpdbError, Result};
use crate::ipdb::types::FIELD_SEPARATOR;
use crate::ipdb::{read_node, resolve};
use log::debug;
use rustc_hash::FxHashSet;
use std::path::Path;

/// Stop recording individual errors after this many
const MAX_REPORTED_ERRORS: usize = 100;

/// Validation strictness level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    /// Header, node array bounds, every leaf record resolvable
    Standard,
    /// Standard checks plus record column counts and IPv4 prefix sanity (default)
    Strict,
}

/// Validation report with detailed findings
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Critical errors that make the database unusable
    pub errors: Vec<String>,
    /// Warnings about potential issues (non-fatal)
    pub warnings: Vec<String>,
    /// Informational messages about database properties
    pub info: Vec<String>,
    /// Database statistics
    pub stats: DatabaseStats,
}

/// Database statistics gathered during validation
#[derive(Debug, Clone, Default)]
pub struct DatabaseStats {
    /// File size in bytes
    pub file_size: usize,
    /// Bytes following the header (node array + data segment)
    pub body_size: usize,
    /// Number of trie nodes
    pub node_count: u32,
    /// Child pointers that name another node
    pub node_pointers: usize,
    /// Child pointers equal to `node_count` (no data)
    pub empty_pointers: usize,
    /// Child pointers that are leaf tokens
    pub leaf_pointers: usize,
    /// Distinct records referenced by leaf tokens
    pub distinct_records: usize,
    /// Payload bytes across distinct records
    pub record_bytes: usize,
    /// Longest record payload
    pub max_record_len: usize,
}

impl DatabaseStats {
    /// One-line human readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} bytes, {} nodes, {} leaf pointers, {} empty, {} distinct records (max {} bytes)",
            self.file_size,
            self.node_count,
            self.leaf_pointers,
            self.empty_pointers,
            self.distinct_records,
            self.max_record_len
        )
    }
}

impl ValidationReport {
    fn new() -> Self {
        Self::default()
    }

    fn error(&mut self, msg: impl Into<String>) {
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(msg.into());
        } else if self.errors.len() == MAX_REPORTED_ERRORS {
            self.errors
                .push("Too many errors, further errors suppressed".to_string());
        }
    }

    fn warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn info(&mut self, msg: impl Into<String>) {
        self.info.push(msg.into());
    }

    /// True when no errors were found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Load and validate a database file
///
/// Decoding failures are recorded in the report; only I/O errors are
/// returned as `Err`.
pub fn validate_file<P: AsRef<Path>>(path: P, level: ValidationLevel) -> Result<ValidationReport> {
    match Reader::open(path) {
        Ok(reader) => Ok(validate_reader(&reader, level)),
        Err(IpdbError::Io(e)) => Err(IpdbError::Io(e)),
        Err(e) => {
            let mut report = ValidationReport::new();
            report.error(format!("Failed to load database: {}", e));
            Ok(report)
        }
    }
}

/// Validate an already loaded database
pub fn validate_reader(reader: &Reader, level: ValidationLevel) -> ValidationReport {
    let mut report = ValidationReport::new();
    let meta = reader.metadata();
    let body = reader.body();

    report.stats.file_size = reader.len();
    report.stats.body_size = body.len();
    report.stats.node_count = meta.node_count;

    validate_header(reader, &mut report);

    // Columns a record needs so that every language block is complete
    let expected_columns = meta
        .languages
        .values()
        .map(|offset| offset + meta.fields.len())
        .max()
        .unwrap_or(0);

    let mut seen: FxHashSet<u32> = FxHashSet::default();
    let mut short_records = 0usize;

    'nodes: for node in 0..meta.node_count {
        for bit in 0..2u8 {
            let child = match read_node(body, node, bit) {
                Ok(child) => child,
                Err(e) => {
                    report.error(format!("Node {}: {}", node, e));
                    break 'nodes;
                }
            };

            if child < meta.node_count {
                report.stats.node_pointers += 1;
                continue;
            }
            if child == meta.node_count {
                report.stats.empty_pointers += 1;
                continue;
            }

            report.stats.leaf_pointers += 1;
            if !seen.insert(child) {
                continue;
            }

            match resolve(body, meta, child) {
                Ok(text) => {
                    report.stats.distinct_records += 1;
                    report.stats.record_bytes += text.len();
                    report.stats.max_record_len = report.stats.max_record_len.max(text.len());

                    if level == ValidationLevel::Strict
                        && text.split(FIELD_SEPARATOR).count() < expected_columns
                    {
                        short_records += 1;
                    }
                }
                Err(e) => report.error(format!("Node {} child {}: {}", node, bit, e)),
            }
        }
    }

    debug!(
        "Validated {} nodes, {} distinct records",
        meta.node_count, report.stats.distinct_records
    );

    if short_records > 0 {
        report.warning(format!(
            "{} records have fewer than the {} columns needed for all language blocks",
            short_records, expected_columns
        ));
    }

    if level == ValidationLevel::Strict {
        validate_v4_entry(reader, &mut report);
    }

    report.info(format!(
        "{} nodes, {} leaf pointers, {} distinct records",
        meta.node_count, report.stats.leaf_pointers, report.stats.distinct_records
    ));

    report
}

fn validate_header(reader: &Reader, report: &mut ValidationReport) {
    let meta = reader.metadata();
    let body_len = report.stats.body_size as u64;

    if meta.total_size != body_len {
        report.warning(format!(
            "Header total_size {} does not match the {} bytes after the header",
            meta.total_size, body_len
        ));
    }

    match (meta.supports(IpVersion::V4), meta.supports(IpVersion::V6)) {
        (true, true) => report.info("IP versions: IPv4 and IPv6"),
        (true, false) => report.info("IP versions: IPv4"),
        (false, true) => report.info("IP versions: IPv6"),
        (false, false) => report.error(format!(
            "ip_version {} declares neither IPv4 nor IPv6",
            meta.ip_version
        )),
    }

    if meta.languages.is_empty() {
        report.error("Header declares no languages");
    } else {
        report.info(format!("Languages: {}", reader.languages().join(", ")));
    }

    if meta.fields.is_empty() {
        report.warning("Header declares no fields");
    } else {
        report.info(format!("Fields: {}", meta.fields.join(", ")));
    }

    let mut offsets: Vec<usize> = meta.languages.values().copied().collect();
    offsets.sort_unstable();
    if offsets
        .windows(2)
        .any(|pair| pair[1] - pair[0] < meta.fields.len())
    {
        report.warning("Language blocks overlap: offsets are closer than the field count");
    }
}

fn validate_v4_entry(reader: &Reader, report: &mut ValidationReport) {
    if !reader.is_ipv4() {
        return;
    }
    let node_count = reader.metadata().node_count;
    let v4 = reader.v4_offset();
    if v4 == node_count {
        report.warning("IPv4-mapped prefix leads to an empty subtree; no IPv4 address will match");
    } else if v4 > node_count {
        report.info("Whole IPv4 space maps to a single record");
    }
}
