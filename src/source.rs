//! Addressable byte sources
//!
//! Everything downstream of loading (header decoding, trie descent, record
//! resolution) only needs random-access reads over an immutable buffer of
//! known length. [`ByteSource`] is that capability; owned buffers and
//! memory-mapped files both provide it, so there is exactly one trie walk and
//! one record decoder regardless of how the bytes were loaded.

use crate::mmap::MmapFile;

/// Random-access reads over an immutable buffer
pub trait ByteSource {
    /// Total number of readable bytes
    fn len(&self) -> usize;

    /// Read `length` bytes starting at `offset`
    ///
    /// Returns `None` if the range does not lie entirely inside the source.
    fn read_at(&self, offset: usize, length: usize) -> Option<&[u8]>;

    /// True when the source holds no bytes
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ByteSource for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    #[inline]
    fn read_at(&self, offset: usize, length: usize) -> Option<&[u8]> {
        let end = offset.checked_add(length)?;
        self.get(offset..end)
    }
}

impl ByteSource for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline]
    fn read_at(&self, offset: usize, length: usize) -> Option<&[u8]> {
        self.as_slice().read_at(offset, length)
    }
}

/// Storage for database data - either owned or memory-mapped
#[derive(Debug)]
pub enum Storage {
    /// Bytes fully materialized in memory
    Owned(Vec<u8>),
    /// Memory-mapped database file
    Mapped(MmapFile),
}

impl Storage {
    /// The whole buffer as a slice
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Owned(v) => v.as_slice(),
            Storage::Mapped(m) => m.as_slice(),
        }
    }

    /// Short label for diagnostics ("owned" or "mmap")
    pub fn kind(&self) -> &'static str {
        match self {
            Storage::Owned(_) => "owned",
            Storage::Mapped(_) => "mmap",
        }
    }
}

impl ByteSource for MmapFile {
    fn len(&self) -> usize {
        self.size()
    }

    #[inline]
    fn read_at(&self, offset: usize, length: usize) -> Option<&[u8]> {
        self.get_slice(offset, length)
    }
}

impl ByteSource for Storage {
    fn len(&self) -> usize {
        match self {
            Storage::Owned(v) => v.len(),
            Storage::Mapped(m) => m.size(),
        }
    }

    #[inline]
    fn read_at(&self, offset: usize, length: usize) -> Option<&[u8]> {
        match self {
            Storage::Owned(v) => v.read_at(offset, length),
            Storage::Mapped(m) => m.read_at(offset, length),
        }
    }
}
