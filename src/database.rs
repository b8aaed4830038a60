//! IPDB Reader
//!
//! [`Reader`] owns one immutable byte buffer (owned or memory-mapped), the
//! decoded header and the precomputed IPv4 entry node. After construction
//! every query is a pure function of `(reader, address, language)`: nothing
//! is cached and nothing is mutated, so a single reader can be shared across
//! threads without locks.

use crate::address::Address;
use crate::error::{IpdbError, Result};
use crate::file_reader;
use crate::ipdb::types::FIELD_SEPARATOR;
use crate::ipdb::{compute_v4_offset, decode_header, descend, resolve, Metadata};
use crate::mmap::MmapFile;
use crate::parser::{OrderParser, PairParser};
use crate::source::{ByteSource, Storage};
use crossbeam_channel::Receiver;
use log::{debug, warn};
use rayon::ThreadPool;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// A loaded IPDB database
///
/// # Examples
///
/// ```no_run
/// use ipdb::Reader;
/// use std::net::Ipv4Addr;
///
/// let reader = Reader::open("city.free.ipdb")?;
///
/// if let Some(values) = reader.find(Ipv4Addr::new(1, 1, 1, 1), "CN")? {
///     println!("{}", values.join(" "));
/// }
/// # Ok::<(), ipdb::IpdbError>(())
/// ```
pub struct Reader {
    storage: Storage,
    metadata: Metadata,
    /// Offset of the node array inside `storage`
    body_start: usize,
    /// Node below the IPv4-mapped prefix, where 32-bit lookups begin
    v4_offset: u32,
}

impl Reader {
    /// Open a database file using memory mapping
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mmap = MmapFile::open(path)?;
        debug!("Mapped {} ({} bytes)", path.display(), mmap.size());
        Self::from_storage(Storage::Mapped(mmap))
    }

    /// Load a database from an owned buffer
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_storage(Storage::Owned(data))
    }

    /// Load a database from a stream
    ///
    /// The stream is read to the end before anything is decoded.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Load a database by streaming a file into memory
    ///
    /// Paths ending in `.gz` are decompressed on the fly and `-` reads stdin.
    pub fn open_stream<P: AsRef<Path>>(path: P) -> Result<Self> {
        let stream = file_reader::open(path)?;
        Self::from_reader(stream)
    }

    /// Open a database on a caller-chosen thread pool and wait for it
    ///
    /// The blocking file access runs on `pool`; the calling thread only waits.
    pub fn open_on<P: AsRef<Path> + Send>(pool: &ThreadPool, path: P) -> Result<Self> {
        pool.install(move || Self::open(path))
    }

    /// Start opening a database on `pool` without waiting
    ///
    /// The result arrives on the returned channel. Callers own timeouts, e.g.
    /// via [`Receiver::recv_timeout`]; dropping the receiver abandons the
    /// result but lets the load finish.
    pub fn spawn_open<P: AsRef<Path>>(pool: &ThreadPool, path: P) -> Receiver<Result<Self>> {
        let path = path.as_ref().to_path_buf();
        let (tx, rx) = crossbeam_channel::bounded(1);
        pool.spawn(move || {
            // The receiver may be gone already
            let _ = tx.send(Self::open(&path));
        });
        rx
    }

    fn from_storage(storage: Storage) -> Result<Self> {
        let (metadata, body_start) = decode_header(&storage)?;
        let body = &storage.as_slice()[body_start..];

        debug!(
            "IPDB header: {} bytes, build {}, {} nodes, {} languages, {} fields",
            body_start,
            metadata.build,
            metadata.node_count,
            metadata.languages.len(),
            metadata.fields.len()
        );

        if body.len() < metadata.node_array_len() {
            return Err(IpdbError::Corruption(format!(
                "Node array needs {} bytes but only {} follow the header",
                metadata.node_array_len(),
                body.len()
            )));
        }
        if metadata.total_size != body.len() as u64 {
            warn!(
                "Header declares total_size {} but {} bytes follow the header",
                metadata.total_size,
                body.len()
            );
        }
        if metadata.ip_version & 0x03 == 0 {
            warn!(
                "Header ip_version {} declares neither IPv4 nor IPv6",
                metadata.ip_version
            );
        }
        if metadata.fields.is_empty() {
            warn!("Header declares no fields");
        }

        let v4_offset = compute_v4_offset(body, &metadata)?;
        debug!("IPv4 lookups start at node {}", v4_offset);

        Ok(Self {
            storage,
            metadata,
            body_start,
            v4_offset,
        })
    }

    /// Decoded header
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Whether IPv4 lookups are supported
    pub fn is_ipv4(&self) -> bool {
        self.metadata.supports(crate::IpVersion::V4)
    }

    /// Whether IPv6 lookups are supported
    pub fn is_ipv6(&self) -> bool {
        self.metadata.supports(crate::IpVersion::V6)
    }

    /// Language codes, sorted
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.metadata.languages.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }

    /// Field names of one language block
    pub fn fields(&self) -> &[String] {
        &self.metadata.fields
    }

    /// Node where IPv4 lookups begin
    pub fn v4_offset(&self) -> u32 {
        self.v4_offset
    }

    /// Total size of the loaded buffer, header included
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// True for an empty buffer (never the case for a loaded reader)
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// "owned" or "mmap"
    pub fn storage_kind(&self) -> &'static str {
        self.storage.kind()
    }

    /// Node array and data segment, header stripped
    pub(crate) fn body(&self) -> &[u8] {
        &self.storage.as_slice()[self.body_start..]
    }

    fn check_version(&self, address: &Address) -> Result<()> {
        if self.metadata.supports(address.version()) {
            Ok(())
        } else {
            Err(IpdbError::VersionMismatch {
                requested: address.version(),
                supported: self.metadata.ip_version,
            })
        }
    }

    fn language_offset(&self, language: &str) -> Result<usize> {
        self.metadata
            .language_offset(language)
            .ok_or_else(|| IpdbError::UnknownLanguage(language.to_string()))
    }

    /// Leaf token for `address`, or `None` when the trie has no entry
    pub(crate) fn locate(&self, address: &Address) -> Result<Option<u32>> {
        let start = if address.bit_len() == 32 {
            self.v4_offset
        } else {
            0
        };
        descend(self.body(), &self.metadata, address.octets(), start)
    }

    /// Raw record text for `address`, all language blocks included
    pub fn lookup_record<A: Into<Address>>(&self, address: A) -> Result<Option<&str>> {
        let address = address.into();
        self.check_version(&address)?;
        match self.locate(&address)? {
            Some(token) => resolve(self.body(), &self.metadata, token).map(Some),
            None => Ok(None),
        }
    }

    /// Values for `address`, starting at the first column of `language`
    ///
    /// The returned values run to the end of the record; when `language` is
    /// not the last block, values of later blocks follow. Use
    /// [`find_to_pairs`](Self::find_to_pairs) to get exactly one block.
    ///
    /// Returns `Ok(None)` when the address is not in the database.
    ///
    /// # Errors
    ///
    /// - `VersionMismatch` if the database does not cover the address family
    /// - `UnknownLanguage` if `language` is not in the header
    /// - `Corruption` / `Format` if the file is damaged along the lookup path
    pub fn find<A: Into<Address>>(&self, address: A, language: &str) -> Result<Option<Vec<&str>>> {
        let address = address.into();
        self.check_version(&address)?;
        let offset = self.language_offset(language)?;

        let token = match self.locate(&address)? {
            Some(token) => token,
            None => return Ok(None),
        };
        let text = resolve(self.body(), &self.metadata, token)?;
        Ok(Some(text.split(FIELD_SEPARATOR).skip(offset).collect()))
    }

    /// `(field, value)` pairs for `address` in `language`
    ///
    /// Pairs follow the header's field order and stop at whichever runs out
    /// first, fields or values, so later language blocks are never included.
    pub fn find_to_pairs<A: Into<Address>>(
        &self,
        address: A,
        language: &str,
    ) -> Result<Option<Vec<(&str, &str)>>> {
        Ok(self.find(address, language)?.map(|values| {
            self.metadata
                .fields
                .iter()
                .map(String::as_str)
                .zip(values)
                .collect()
        }))
    }

    /// Look up `address` and hand the ordered values to `parser`
    pub fn find_then_parse<T, P, A>(&self, parser: &P, address: A, language: &str) -> Result<Option<T>>
    where
        P: OrderParser<T> + ?Sized,
        A: Into<Address>,
    {
        Ok(self
            .find(address, language)?
            .map(|values| parser.parse(&values)))
    }

    /// Look up `address` and hand the `(field, value)` pairs to `parser`
    pub fn find_then_parse_pairs<T, P, A>(
        &self,
        parser: &P,
        address: A,
        language: &str,
    ) -> Result<Option<T>>
    where
        P: PairParser<T> + ?Sized,
        A: Into<Address>,
    {
        Ok(self
            .find_to_pairs(address, language)?
            .map(|pairs| parser.parse_pairs(&pairs)))
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("storage", &self.storage.kind())
            .field("len", &self.len())
            .field("build", &self.metadata.build)
            .field("ip_version", &self.metadata.ip_version)
            .field("node_count", &self.metadata.node_count)
            .field("v4_offset", &self.v4_offset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::IpVersion;
    use crate::parser::FullInfoParser;
    use std::net::{Ipv4Addr, Ipv6Addr};

    /// Header + one node `{2, 2}` + a padding byte + one record at body offset 9
    fn single_leaf_db(ip_version: u16, languages: &str, fields: &str, record: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&2u32.to_be_bytes());
        body.extend_from_slice(&2u32.to_be_bytes());
        body.push(0);
        body.extend_from_slice(&(record.len() as u16).to_be_bytes());
        body.extend_from_slice(record.as_bytes());

        let header = format!(
            r#"{{"build":1,"ip_version":{},"node_count":1,"languages":{},"fields":{},"total_size":{}}}"#,
            ip_version,
            languages,
            fields,
            body.len()
        );
        let mut db = (header.len() as u32).to_be_bytes().to_vec();
        db.extend_from_slice(header.as_bytes());
        db.extend_from_slice(&body);
        db
    }

    fn two_language_db() -> Reader {
        let db = single_leaf_db(
            3,
            r#"{"en":0,"cn":2}"#,
            r#"["country_name","city_name"]"#,
            "China\tHangzhou\t中国\t杭州",
        );
        Reader::from_bytes(db).unwrap()
    }

    #[test]
    fn test_single_leaf_fixture() {
        let db = single_leaf_db(1, r#"{"en":0}"#, r#"["country","city"]"#, "US\tNYC");
        let reader = Reader::from_bytes(db).unwrap();

        assert_eq!(reader.v4_offset(), 2);
        assert_eq!(reader.storage_kind(), "owned");
        let values = reader.find(Ipv4Addr::new(203, 0, 113, 9), "en").unwrap();
        assert_eq!(values, Some(vec!["US", "NYC"]));
    }

    #[test]
    fn test_language_slicing() {
        let reader = two_language_db();
        let addr = Ipv4Addr::new(1, 2, 3, 4);

        assert_eq!(
            reader.find(addr, "en").unwrap().unwrap(),
            vec!["China", "Hangzhou", "中国", "杭州"]
        );
        assert_eq!(reader.find(addr, "cn").unwrap().unwrap(), vec!["中国", "杭州"]);
    }

    #[test]
    fn test_pairs_truncate_to_one_block() {
        let reader = two_language_db();
        let pairs = reader
            .find_to_pairs(Ipv4Addr::new(1, 2, 3, 4), "en")
            .unwrap()
            .unwrap();
        assert_eq!(
            pairs,
            vec![("country_name", "China"), ("city_name", "Hangzhou")]
        );
    }

    #[test]
    fn test_find_then_parse() {
        fn first(values: &[&str]) -> String {
            values[0].to_string()
        }

        let reader = two_language_db();
        let addr = Address::V6([0; 16]);
        assert_eq!(
            reader.find_then_parse(&first, addr, "cn").unwrap(),
            Some("中国".to_string())
        );

        let info = reader
            .find_then_parse_pairs(&FullInfoParser, addr, "cn")
            .unwrap()
            .unwrap();
        assert_eq!(info.country_name, "中国");
        assert_eq!(info.city_name, "杭州");
    }

    #[test]
    fn test_version_mismatch() {
        let db = single_leaf_db(1, r#"{"en":0}"#, r#"["a"]"#, "x");
        let reader = Reader::from_bytes(db).unwrap();
        assert!(reader.is_ipv4());
        assert!(!reader.is_ipv6());

        let err = reader.find(Ipv6Addr::LOCALHOST, "en").unwrap_err();
        assert!(matches!(
            err,
            IpdbError::VersionMismatch {
                requested: IpVersion::V6,
                supported: 1
            }
        ));
    }

    #[test]
    fn test_unknown_language() {
        let reader = two_language_db();
        let err = reader.find(Ipv4Addr::LOCALHOST, "fr").unwrap_err();
        assert!(matches!(err, IpdbError::UnknownLanguage(ref l) if l == "fr"));
    }

    #[test]
    fn test_truncated_node_array_rejected() {
        let mut db = single_leaf_db(1, r#"{"en":0}"#, r#"["a"]"#, "x");
        let header_len = u32::from_be_bytes([db[0], db[1], db[2], db[3]]) as usize;
        db.truncate(4 + header_len + 5);
        assert!(matches!(
            Reader::from_bytes(db),
            Err(IpdbError::Corruption(_))
        ));
    }

    #[test]
    fn test_introspection() {
        let reader = two_language_db();
        assert_eq!(reader.languages(), vec!["cn", "en"]);
        assert_eq!(reader.fields().len(), 2);
        assert!(reader.len() > 0);
        assert!(!reader.is_empty());
        assert_eq!(
            reader.lookup_record(Ipv4Addr::new(9, 9, 9, 9)).unwrap(),
            Some("China\tHangzhou\t中国\t杭州")
        );
        let debug = format!("{:?}", reader);
        assert!(debug.contains("node_count: 1"));
    }

    #[test]
    fn test_reader_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Reader>();
    }
}
