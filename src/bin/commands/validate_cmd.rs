use anyhow::{Context, Result};
use ipdb::validation::{validate_file, ValidationLevel};
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;

pub fn cmd_validate(
    database: PathBuf,
    level_str: String,
    json_output: bool,
    verbose: bool,
) -> Result<()> {
    let level = match level_str.to_lowercase().as_str() {
        "standard" => ValidationLevel::Standard,
        "strict" => ValidationLevel::Strict,
        _ => {
            anyhow::bail!(
                "Invalid validation level: '{}'. Must be: standard or strict",
                level_str
            );
        }
    };

    let start = Instant::now();
    let report = validate_file(&database, level)
        .with_context(|| format!("Validation failed: {}", database.display()))?;
    let duration = start.elapsed();

    if json_output {
        let output = json!({
            "database": database.display().to_string(),
            "validation_level": level_str,
            "is_valid": report.is_valid(),
            "duration_ms": duration.as_millis(),
            "errors": report.errors,
            "warnings": report.warnings,
            "info": report.info,
            "stats": {
                "file_size": report.stats.file_size,
                "body_size": report.stats.body_size,
                "node_count": report.stats.node_count,
                "node_pointers": report.stats.node_pointers,
                "empty_pointers": report.stats.empty_pointers,
                "leaf_pointers": report.stats.leaf_pointers,
                "distinct_records": report.stats.distinct_records,
                "record_bytes": report.stats.record_bytes,
                "max_record_len": report.stats.max_record_len,
            }
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Validating: {}", database.display());
        println!("Level:      {}", level_str);
        println!();

        println!("Statistics:");
        println!("  {}", report.stats.summary());
        println!("  Validation time: {}ms", duration.as_millis());
        println!();

        if !report.errors.is_empty() {
            println!("❌ ERRORS ({}):", report.errors.len());
            for error in &report.errors {
                println!("  • {}", error);
            }
            println!();
        }

        if !report.warnings.is_empty() && verbose {
            println!("⚠️  WARNINGS ({}):", report.warnings.len());
            for warning in &report.warnings {
                println!("  • {}", warning);
            }
            println!();
        } else if !report.warnings.is_empty() {
            println!(
                "⚠️  {} warning(s) (use --verbose to show)",
                report.warnings.len()
            );
            println!();
        }

        if verbose && !report.info.is_empty() {
            println!("ℹ️  INFORMATION ({}):", report.info.len());
            for info in &report.info {
                println!("  • {}", info);
            }
            println!();
        }

        if report.is_valid() {
            println!("✅ VALIDATION PASSED");
        } else {
            println!("❌ VALIDATION FAILED");
            println!("   Database has {} critical error(s).", report.errors.len());
        }
    }

    if report.is_valid() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
