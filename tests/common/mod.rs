//! Builds small IPDB files for tests and benchmarks
//!
//! Layout produced:
//! - node array (`N` nodes, root at 0)
//! - data segment starting with a sentinel node `[N, N]`, so an empty child
//!   (pointer `N`) loops on itself and lookups end as not-found
//! - deduplicated records (`u16` BE length + UTF-8)
//!
//! IPv4 entries live under the IPv4-mapped prefix (80 zero bits, 16 one bits).
//! Insert broader prefixes before more specific ones.

#![allow(dead_code)]

use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::net::{Ipv4Addr, Ipv6Addr};
use tempfile::NamedTempFile;

#[derive(Clone, Copy, Debug)]
enum Slot {
    Empty,
    Node(usize),
    Leaf(usize),
}

pub struct IpdbBuilder {
    build: u64,
    ip_version: Option<u16>,
    languages: Vec<(String, usize)>,
    fields: Vec<String>,
    nodes: Vec<[Slot; 2]>,
    records: Vec<String>,
    record_index: HashMap<String, usize>,
    has_v4: bool,
    has_v6: bool,
}

impl IpdbBuilder {
    /// Builder with a single `CN` language at column 0
    pub fn new(fields: &[&str]) -> Self {
        Self {
            build: 1_700_000_000,
            ip_version: None,
            languages: vec![("CN".to_string(), 0)],
            fields: fields.iter().map(|f| f.to_string()).collect(),
            nodes: vec![[Slot::Empty, Slot::Empty]],
            records: Vec::new(),
            record_index: HashMap::new(),
            has_v4: false,
            has_v6: false,
        }
    }

    pub fn languages(mut self, languages: &[(&str, usize)]) -> Self {
        self.languages = languages
            .iter()
            .map(|(l, o)| (l.to_string(), *o))
            .collect();
        self
    }

    /// Override the `ip_version` bitmask (default: derived from inserts)
    pub fn ip_version(mut self, ip_version: u16) -> Self {
        self.ip_version = Some(ip_version);
        self
    }

    pub fn build_id(mut self, build: u64) -> Self {
        self.build = build;
        self
    }

    /// Map an IPv4 CIDR (`a.b.c.d/len`) to a record of tab-joined values
    pub fn insert_v4(mut self, cidr: &str, values: &[&str]) -> Self {
        let (addr, prefix) = cidr.split_once('/').unwrap_or((cidr, "32"));
        let addr: Ipv4Addr = addr.parse().unwrap();
        let prefix: usize = prefix.parse().unwrap();
        assert!(prefix <= 32);

        let mut bits = vec![false; 80];
        bits.extend(std::iter::repeat(true).take(16));
        bits.extend(octet_bits(&addr.octets()).take(prefix));

        self.has_v4 = true;
        self.insert_bits(&bits, &values.join("\t"));
        self
    }

    /// Map an IPv6 CIDR to a record of tab-joined values
    pub fn insert_v6(mut self, cidr: &str, values: &[&str]) -> Self {
        let (addr, prefix) = cidr.split_once('/').unwrap_or((cidr, "128"));
        let addr: Ipv6Addr = addr.parse().unwrap();
        let prefix: usize = prefix.parse().unwrap();
        assert!((1..=128).contains(&prefix));

        let bits: Vec<bool> = octet_bits(&addr.octets()).take(prefix).collect();
        self.has_v6 = true;
        self.insert_bits(&bits, &values.join("\t"));
        self
    }

    fn record_id(&mut self, record: &str) -> usize {
        if let Some(&id) = self.record_index.get(record) {
            return id;
        }
        let id = self.records.len();
        self.records.push(record.to_string());
        self.record_index.insert(record.to_string(), id);
        id
    }

    fn insert_bits(&mut self, bits: &[bool], record: &str) {
        let rec = self.record_id(record);
        let mut node = 0;
        for (i, &bit) in bits.iter().enumerate() {
            let side = bit as usize;
            if i == bits.len() - 1 {
                self.nodes[node][side] = Slot::Leaf(rec);
                return;
            }
            node = match self.nodes[node][side] {
                Slot::Node(next) => next,
                Slot::Empty => self.push_node(node, side, [Slot::Empty, Slot::Empty]),
                // Split an existing leaf so the broader prefix keeps covering the sibling
                leaf @ Slot::Leaf(_) => self.push_node(node, side, [leaf, leaf]),
            };
        }
    }

    fn push_node(&mut self, parent: usize, side: usize, children: [Slot; 2]) -> usize {
        let id = self.nodes.len();
        self.nodes.push(children);
        self.nodes[parent][side] = Slot::Node(id);
        id
    }

    /// Serialize to IPDB bytes
    pub fn build(&self) -> Vec<u8> {
        let n = self.nodes.len() as u32;

        // Sentinel node, then the records
        let mut data = Vec::new();
        data.extend_from_slice(&n.to_be_bytes());
        data.extend_from_slice(&n.to_be_bytes());
        let mut record_offsets = Vec::with_capacity(self.records.len());
        for record in &self.records {
            record_offsets.push(data.len() as u32);
            data.extend_from_slice(&(record.len() as u16).to_be_bytes());
            data.extend_from_slice(record.as_bytes());
        }

        let encode = |slot: Slot| -> u32 {
            match slot {
                Slot::Empty => n,
                Slot::Node(id) => id as u32,
                Slot::Leaf(rec) => n + record_offsets[rec],
            }
        };

        let mut body = Vec::with_capacity(self.nodes.len() * 8 + data.len());
        for node in &self.nodes {
            body.extend_from_slice(&encode(node[0]).to_be_bytes());
            body.extend_from_slice(&encode(node[1]).to_be_bytes());
        }
        body.extend_from_slice(&data);

        let ip_version = self
            .ip_version
            .unwrap_or((self.has_v4 as u16) | ((self.has_v6 as u16) << 1));
        let languages: serde_json::Map<String, serde_json::Value> = self
            .languages
            .iter()
            .map(|(l, o)| (l.clone(), json!(o)))
            .collect();
        let header = json!({
            "build": self.build,
            "ip_version": ip_version,
            "node_count": n,
            "languages": languages,
            "fields": self.fields,
            "total_size": body.len(),
        })
        .to_string();

        let mut out = (header.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&body);
        out
    }
}

fn octet_bits(octets: &[u8]) -> impl Iterator<Item = bool> + '_ {
    octets
        .iter()
        .flat_map(|&b| (0..8).rev().map(move |i| (b >> i) & 1 == 1))
}

/// Length of the JSON header of an IPDB buffer
pub fn header_len(db: &[u8]) -> usize {
    u32::from_be_bytes([db[0], db[1], db[2], db[3]]) as usize
}

/// Two-language city database covering a few IPv4 and IPv6 ranges
pub fn sample_city_db() -> Vec<u8> {
    IpdbBuilder::new(&["country_name", "region_name", "city_name"])
        .languages(&[("CN", 0), ("EN", 3)])
        .insert_v4("1.0.0.0/8", &["澳大利亚", "", "", "Australia", "", ""])
        .insert_v4("1.2.3.0/24", &["中国", "浙江", "杭州", "China", "Zhejiang", "Hangzhou"])
        .insert_v4("8.8.8.8/32", &["GOOGLE.COM", "", "", "GOOGLE.COM", "", ""])
        .insert_v4("114.114.0.0/16", &["中国", "江苏", "南京", "China", "Jiangsu", "Nanjing"])
        .insert_v4("203.0.113.0/24", &["美国", "纽约", "纽约", "United States", "New York", "New York"])
        .insert_v6("2001:250::/32", &["中国", "北京", "北京", "China", "Beijing", "Beijing"])
        .insert_v6("2404:6800::/32", &["澳大利亚", "", "", "Australia", "", ""])
        .build()
}

/// Write `bytes` to a temporary file with the given suffix
pub fn write_temp(bytes: &[u8], suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
