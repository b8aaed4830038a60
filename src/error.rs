//! Error types for the ipdb library

use crate::address::IpVersion;
use std::fmt;
use std::io;

/// Result type alias for ipdb operations
pub type Result<T> = std::result::Result<T, IpdbError>;

/// Main error type for loading and querying IPDB databases
#[derive(Debug)]
pub enum IpdbError {
    /// Malformed or truncated header, or invalid UTF-8 in a record
    Format(String),

    /// A computed offset or length points outside the buffer
    Corruption(String),

    /// The queried address family is not supported by the database
    VersionMismatch {
        /// Family of the address that was queried
        requested: IpVersion,
        /// Raw `ip_version` bitmask declared by the database
        supported: u16,
    },

    /// The requested language code is not present in the database
    UnknownLanguage(String),

    /// A raw address slice that is neither 4 nor 16 bytes long
    InvalidAddress(usize),

    /// I/O errors while loading
    Io(io::Error),
}

impl fmt::Display for IpdbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpdbError::Format(msg) => write!(f, "Format error: {}", msg),
            IpdbError::Corruption(msg) => write!(f, "Corrupt database: {}", msg),
            IpdbError::VersionMismatch {
                requested,
                supported,
            } => write!(
                f,
                "Database does not support {} lookups (ip_version bitmask = {:#04b})",
                requested, supported
            ),
            IpdbError::UnknownLanguage(lang) => write!(f, "No such language: {}", lang),
            IpdbError::InvalidAddress(len) => write!(
                f,
                "Invalid address: expected 4 or 16 bytes, got {}",
                len
            ),
            IpdbError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for IpdbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IpdbError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for IpdbError {
    fn from(err: io::Error) -> Self {
        IpdbError::Io(err)
    }
}
