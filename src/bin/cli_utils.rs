use anyhow::{bail, Context, Result};
use ipdb::Reader;
use std::io;
use std::net::IpAddr;
use std::path::Path;

/// Language picked when the user does not name one
const PREFERRED_LANGUAGE: &str = "CN";

/// Line scanner over a buffered reader using memchr.
/// Skips blank lines and `#` comments; trims surrounding ASCII whitespace.
pub struct LineScanner<R: io::BufRead> {
    reader: R,
    partial: Vec<u8>,
    eof: bool,
}

impl<R: io::BufRead> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            partial: Vec::new(),
            eof: false,
        }
    }

    fn accept(bytes: &[u8], line_buf: &mut Vec<u8>) -> bool {
        let trimmed = bytes.trim_ascii();
        if trimmed.is_empty() || trimmed[0] == b'#' {
            return false;
        }
        line_buf.extend_from_slice(trimmed);
        true
    }

    /// Read the next address line into `line_buf`.
    /// Returns Ok(false) at end of input.
    pub fn read_line(&mut self, line_buf: &mut Vec<u8>) -> io::Result<bool> {
        line_buf.clear();

        loop {
            if self.eof {
                let partial = std::mem::take(&mut self.partial);
                return Ok(Self::accept(&partial, line_buf));
            }

            let buffer = self.reader.fill_buf()?;
            if buffer.is_empty() {
                self.eof = true;
                continue;
            }

            match memchr::memchr(b'\n', buffer) {
                Some(pos) => {
                    let found = if self.partial.is_empty() {
                        Self::accept(&buffer[..pos], line_buf)
                    } else {
                        self.partial.extend_from_slice(&buffer[..pos]);
                        let partial = std::mem::take(&mut self.partial);
                        Self::accept(&partial, line_buf)
                    };
                    self.reader.consume(pos + 1);
                    if found {
                        return Ok(true);
                    }
                }
                None => {
                    self.partial.extend_from_slice(buffer);
                    let consumed = buffer.len();
                    self.reader.consume(consumed);
                }
            }
        }
    }
}

pub fn open_database(path: &Path) -> Result<Reader> {
    Reader::open(path).with_context(|| format!("Failed to load database: {}", path.display()))
}

/// Resolve the language to query, validating a user-supplied one
pub fn pick_language(reader: &Reader, requested: Option<String>) -> Result<String> {
    let languages = reader.languages();
    match requested {
        Some(lang) => {
            if !languages.contains(&lang.as_str()) {
                bail!(
                    "Unknown language '{}'. Available: {}",
                    lang,
                    languages.join(", ")
                );
            }
            Ok(lang)
        }
        None => {
            if languages.contains(&PREFERRED_LANGUAGE) {
                return Ok(PREFERRED_LANGUAGE.to_string());
            }
            languages
                .first()
                .map(|l| l.to_string())
                .context("Database declares no languages")
        }
    }
}

pub fn parse_ip(text: &str) -> Result<IpAddr> {
    text.parse::<IpAddr>()
        .with_context(|| format!("Invalid IP address: '{}'", text))
}

pub fn pairs_to_json(pairs: &[(&str, &str)]) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect();
    serde_json::Value::Object(map)
}

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

pub fn format_qps(qps: f64) -> String {
    if qps >= 1_000_000.0 {
        format!("{:.2}M", qps / 1_000_000.0)
    } else if qps >= 1_000.0 {
        format!("{:.2}K", qps / 1_000.0)
    } else {
        format!("{:.2}", qps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn scan_all(input: &[u8], capacity: usize) -> Vec<String> {
        let mut scanner = LineScanner::new(BufReader::with_capacity(capacity, Cursor::new(input)));
        let mut buf = Vec::new();
        let mut out = Vec::new();
        while scanner.read_line(&mut buf).unwrap() {
            out.push(String::from_utf8(buf.clone()).unwrap());
        }
        out
    }

    #[test]
    fn test_scanner_skips_blank_and_comment_lines() {
        let input = b"# header\n1.1.1.1\n\n  8.8.8.8  \r\n2001:db8::1";
        assert_eq!(scan_all(input, 4096), vec!["1.1.1.1", "8.8.8.8", "2001:db8::1"]);
    }

    #[test]
    fn test_scanner_lines_split_across_buffers() {
        let input = b"192.168.100.200\n10.0.0.1\n";
        assert_eq!(scan_all(input, 3), vec!["192.168.100.200", "10.0.0.1"]);
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_qps(2_500_000.0), "2.50M");
    }
}
