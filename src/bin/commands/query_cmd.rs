use anyhow::{bail, Context, Result};
use ipdb::FullInfoParser;
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::{open_database, pairs_to_json, parse_ip, pick_language};

pub fn cmd_query(
    database: PathBuf,
    ip: String,
    language: Option<String>,
    format: String,
    quiet: bool,
) -> Result<()> {
    let reader = open_database(&database)?;
    let language = pick_language(&reader, language)?;
    let addr = parse_ip(&ip)?;

    let result = match format.as_str() {
        "pairs" => reader
            .find_to_pairs(addr, &language)
            .map(|found| found.map(|pairs| pairs_to_json(&pairs))),
        "values" => reader
            .find(addr, &language)
            .map(|found| found.map(|values| json!(values))),
        "full" => reader
            .find_then_parse_pairs(&FullInfoParser, addr, &language)
            .map(|found| found.map(|info| json!(info))),
        other => bail!(
            "Invalid output format: '{}'. Must be: pairs, values, or full",
            other
        ),
    }
    .with_context(|| format!("Query failed for: {}", ip))?;

    let found = result.is_some();

    if !quiet {
        match result {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => println!("null"),
        }
    }

    std::process::exit(if found { 0 } else { 1 });
}
