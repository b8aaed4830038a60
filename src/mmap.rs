//! Memory-mapped file support for IPDB files.
//!
//! # Safety
//!
//! While memory-mapped files are inherently unsafe (file contents can change),
//! this module provides a safe API by:
//! - Checking the file is large enough to carry the header length prefix
//! - Using safe Rust types for all public APIs
//! - Providing bounds-checked accessors
//!
//! # Example
//!
//! ```no_run
//! use ipdb::mmap::MmapFile;
//!
//! let mmap = MmapFile::open("city.ipdb")?;
//! println!("Size: {} bytes", mmap.size());
//! # Ok::<(), ipdb::mmap::MmapError>(())
//! ```

use crate::error::IpdbError;
use memmap2::Mmap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

/// Smallest file that can hold the 4-byte header length prefix
pub const MIN_FILE_SIZE: usize = 4;

/// Errors that can occur when working with memory-mapped files.
#[derive(Debug)]
pub enum MmapError {
    /// Failed to open or map the file
    Io(io::Error),
    /// File is too small to contain a valid header
    FileTooSmall {
        /// Actual file size in bytes
        size: usize,
        /// Minimum required size in bytes
        required: usize,
    },
}

impl fmt::Display for MmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MmapError::Io(e) => write!(f, "I/O error: {}", e),
            MmapError::FileTooSmall { size, required } => {
                write!(f, "File too small: {} bytes (need at least {})", size, required)
            }
        }
    }
}

impl std::error::Error for MmapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MmapError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MmapError {
    fn from(err: io::Error) -> Self {
        MmapError::Io(err)
    }
}

impl From<MmapError> for IpdbError {
    fn from(err: MmapError) -> Self {
        match err {
            MmapError::Io(e) => IpdbError::Io(e),
            other => IpdbError::Format(other.to_string()),
        }
    }
}

/// A read-only memory-mapped IPDB file.
///
/// The file is automatically unmapped when the `MmapFile` is dropped.
pub struct MmapFile {
    /// The memory-mapped file
    mmap: Mmap,
    /// Size of the mapped region
    size: usize,
}

impl MmapFile {
    /// Open and memory-map a database file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened or mapped
    /// - The file is too small to hold the header length prefix
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MmapError> {
        let file = File::open(path.as_ref())?;
        // SAFETY: the mapping is read-only and never handed out beyond the
        // lifetime of `MmapFile`; all reads go through bounds-checked slices.
        let mmap = unsafe { Mmap::map(&file)? };
        let size = mmap.len();

        if size < MIN_FILE_SIZE {
            return Err(MmapError::FileTooSmall {
                size,
                required: MIN_FILE_SIZE,
            });
        }

        Ok(MmapFile { mmap, size })
    }

    /// Get the size of the memory-mapped file in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get a slice of the entire mapped memory.
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Get a slice at a specific offset with bounds checking.
    ///
    /// Returns `None` if the offset + length would exceed the file size.
    pub fn get_slice(&self, offset: usize, length: usize) -> Option<&[u8]> {
        if offset.checked_add(length)? > self.size {
            return None;
        }
        Some(&self.mmap[offset..offset + length])
    }
}

impl fmt::Debug for MmapFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmapFile").field("size", &self.size).finish()
    }
}
