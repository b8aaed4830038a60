#![no_main]
use ipdb::{Address, Reader};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

const HEADER: &str = r#"{"build":1,"ip_version":3,"node_count":2,"languages":{"CN":0,"EN":1},"fields":["country_name"],"total_size":0}"#;

/// Fixed header over a fuzzer-controlled body, so the input drives the trie
/// and the data segment directly
fn with_body(body: &[u8]) -> Vec<u8> {
    let mut db = (HEADER.len() as u32).to_be_bytes().to_vec();
    db.extend_from_slice(HEADER.as_bytes());
    db.extend_from_slice(body);
    db
}

static EMPTY_TREE: OnceLock<Reader> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let address = match data.len() {
        n if n >= 16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&data[..16]);
            Address::V6(octets)
        }
        n if n >= 4 => Address::V4([data[0], data[1], data[2], data[3]]),
        _ => return,
    };

    // Arbitrary address against a fixed tree whose children all point at the sentinel
    let fixed = EMPTY_TREE.get_or_init(|| {
        let mut body = Vec::new();
        for _ in 0..6 {
            body.extend_from_slice(&2u32.to_be_bytes());
        }
        Reader::from_bytes(with_body(&body)).expect("static fixture loads")
    });
    let _ = fixed.find(address, "CN");

    // Arbitrary body against the same address
    if let Ok(reader) = Reader::from_bytes(with_body(data)) {
        let _ = reader.find(address, "EN");
        let _ = reader.find_to_pairs(address, "CN");
        let _ = reader.lookup_record(address);
    }
});
