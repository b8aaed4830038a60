//! Streaming file reader with automatic gzip decompression
//!
//! Used by the stream-backed loader ([`Reader::open_stream`](crate::Reader::open_stream))
//! and by the CLI to read address lists.
//!
//! # Example
//!
//! ```rust,no_run
//! use ipdb::file_reader;
//! use std::io::BufRead;
//!
//! // Automatically detects .gz and decompresses
//! let reader = file_reader::open("addresses.txt.gz")?;
//!
//! for line in reader.lines() {
//!     let line = line?;
//!     println!("{}", line);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, stdin, BufRead, BufReader};
use std::path::Path;

/// Buffer size for file reading (128KB)
const BUFFER_SIZE: usize = 128 * 1024;

/// Open a file with automatic gzip detection based on file extension
///
/// Files ending in `.gz` (case-insensitive) are automatically decompressed.
/// Special case: path "-" reads from stdin.
///
/// # Errors
///
/// Returns an error if the file doesn't exist or cannot be opened. Invalid
/// gzip data surfaces as an error on the first read.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();

    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stdin())));
    }

    let file = File::open(path)?;

    if is_gzip_path(path) {
        let decoder = GzDecoder::new(file);
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}
