use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::{format_bytes, format_number, open_database};

pub fn cmd_inspect(database: PathBuf, json_output: bool) -> Result<()> {
    let reader = open_database(&database)?;
    let meta = reader.metadata();

    // Languages ordered by column offset
    let mut languages: Vec<(&str, usize)> = meta
        .languages
        .iter()
        .map(|(lang, offset)| (lang.as_str(), *offset))
        .collect();
    languages.sort_unstable_by_key(|&(lang, offset)| (offset, lang));

    if json_output {
        let output = json!({
            "file": database.display().to_string(),
            "storage": reader.storage_kind(),
            "file_size": reader.len(),
            "ipv4": reader.is_ipv4(),
            "ipv6": reader.is_ipv6(),
            "v4_offset": reader.v4_offset(),
            "metadata": serde_json::to_value(meta)?,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Database:   {}", database.display());
    println!("Size:       {}", format_bytes(reader.len()));
    println!("Build:      {}", meta.build);
    println!();
    println!("Capabilities:");
    println!("  IPv4 lookups:    {}", if reader.is_ipv4() { "✓" } else { "✗" });
    println!("  IPv6 lookups:    {}", if reader.is_ipv6() { "✓" } else { "✗" });
    println!();
    println!("Index:");
    println!("  Node count:      {}", format_number(meta.node_count as usize));
    println!("  IPv4 entry node: {}", reader.v4_offset());
    println!("  Declared size:   {}", format_number(meta.total_size as usize));
    println!();
    println!("Languages:");
    for (lang, offset) in &languages {
        println!("  {:<6} column {}", lang, offset);
    }
    println!();
    println!("Fields ({}):", meta.fields.len());
    for field in &meta.fields {
        println!("  {}", field);
    }

    Ok(())
}
