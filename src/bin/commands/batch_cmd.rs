use anyhow::{bail, Context, Result};
use ipdb::{IpdbError, Reader};
use rayon::prelude::*;
use serde_json::json;
use std::io::{self, Write};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Instant;

use crate::cli_utils::{format_number, format_qps, open_database, pick_language, LineScanner};

/// Addresses looked up per parallel chunk
const CHUNK_LINES: usize = 8192;

enum Outcome {
    Found(Vec<String>),
    NotFound,
    Invalid(String),
}

#[derive(Default)]
struct BatchStats {
    lines: usize,
    found: usize,
    not_found: usize,
    invalid: usize,
}

enum Output<W: Write> {
    Json(W),
    Csv(csv::Writer<W>),
}

impl<W: Write> Output<W> {
    fn header(&mut self, fields: &[String]) -> Result<()> {
        if let Output::Csv(writer) = self {
            let mut row = vec!["ip"];
            row.extend(fields.iter().map(String::as_str));
            row.push("status");
            writer.write_record(&row)?;
        }
        Ok(())
    }

    fn row(&mut self, fields: &[String], ip: &str, outcome: &Outcome) -> Result<()> {
        match self {
            Output::Json(out) => {
                let value = match outcome {
                    Outcome::Found(values) => {
                        let data: serde_json::Map<String, serde_json::Value> = fields
                            .iter()
                            .zip(values)
                            .map(|(k, v)| (k.clone(), json!(v)))
                            .collect();
                        json!({ "ip": ip, "found": true, "data": data })
                    }
                    Outcome::NotFound => json!({ "ip": ip, "found": false }),
                    Outcome::Invalid(err) => json!({ "ip": ip, "error": err }),
                };
                serde_json::to_writer(&mut *out, &value)?;
                out.write_all(b"\n")?;
            }
            Output::Csv(writer) => {
                let mut row = vec![ip];
                let status = match outcome {
                    Outcome::Found(values) => {
                        row.extend(
                            (0..fields.len())
                                .map(|i| values.get(i).map(String::as_str).unwrap_or("")),
                        );
                        "found"
                    }
                    Outcome::NotFound => {
                        row.extend(fields.iter().map(|_| ""));
                        "not_found"
                    }
                    Outcome::Invalid(_) => {
                        row.extend(fields.iter().map(|_| ""));
                        "invalid"
                    }
                };
                row.push(status);
                writer.write_record(&row)?;
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self {
            Output::Json(mut out) => out.flush()?,
            Output::Csv(mut writer) => writer.flush()?,
        }
        Ok(())
    }
}

fn lookup_line(reader: &Reader, language: &str, line: &str) -> Result<Outcome> {
    let addr = match line.parse::<IpAddr>() {
        Ok(addr) => addr,
        Err(_) => return Ok(Outcome::Invalid("invalid IP address".to_string())),
    };

    match reader.find_to_pairs(addr, language) {
        Ok(Some(pairs)) => Ok(Outcome::Found(
            pairs.into_iter().map(|(_, v)| v.to_string()).collect(),
        )),
        Ok(None) => Ok(Outcome::NotFound),
        Err(e @ IpdbError::VersionMismatch { .. }) => Ok(Outcome::Invalid(e.to_string())),
        Err(e) => Err(e).with_context(|| format!("Lookup failed for: {}", line)),
    }
}

fn process_chunk(
    reader: &Reader,
    language: &str,
    pool: Option<&rayon::ThreadPool>,
    chunk: &[String],
) -> Result<Vec<Outcome>> {
    match pool {
        Some(pool) => pool.install(|| {
            chunk
                .par_iter()
                .map(|line| lookup_line(reader, language, line))
                .collect()
        }),
        None => chunk
            .iter()
            .map(|line| lookup_line(reader, language, line))
            .collect(),
    }
}

pub fn cmd_batch(
    database: PathBuf,
    inputs: Vec<PathBuf>,
    language: Option<String>,
    threads_arg: Option<String>,
    format: String,
    show_stats: bool,
) -> Result<()> {
    let num_threads = match threads_arg.as_deref() {
        None => 1,
        Some("auto") | Some("0") => 0,
        Some(s) => s.parse::<usize>().with_context(|| {
            format!("Invalid thread count '{}', expected a number or 'auto'", s)
        })?,
    };

    let load_start = Instant::now();
    let reader = open_database(&database)?;
    let language = pick_language(&reader, language)?;
    let fields = reader.fields().to_vec();

    if show_stats {
        eprintln!("[INFO] Loaded database: {}", database.display());
        eprintln!("[INFO] Load time: {}ms", load_start.elapsed().as_millis());
        eprintln!("[INFO] Language: {}", language);
    }

    let pool = if num_threads == 1 {
        None
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .context("Failed to create worker pool")?;
        if show_stats {
            eprintln!("[INFO] Mode: Parallel ({} worker threads)", pool.current_num_threads());
        }
        Some(pool)
    };

    let stdout = io::stdout();
    let sink = io::BufWriter::new(stdout.lock());
    let mut output = match format.as_str() {
        "json" => Output::Json(sink),
        "csv" => Output::Csv(csv::Writer::from_writer(sink)),
        other => bail!("Invalid output format: '{}'. Must be: json or csv", other),
    };
    output.header(&fields)?;

    let mut stats = BatchStats::default();
    let start = Instant::now();
    let mut line_buf = Vec::new();
    let mut chunk: Vec<String> = Vec::with_capacity(CHUNK_LINES);

    for input in &inputs {
        let stream = ipdb::file_reader::open(input)
            .with_context(|| format!("Failed to open input: {}", input.display()))?;
        let mut scanner = LineScanner::new(stream);

        loop {
            let more = scanner
                .read_line(&mut line_buf)
                .with_context(|| format!("Failed to read input: {}", input.display()))?;
            if more {
                chunk.push(String::from_utf8_lossy(&line_buf).into_owned());
            }
            if chunk.len() == CHUNK_LINES || (!more && !chunk.is_empty()) {
                let outcomes = process_chunk(&reader, &language, pool.as_ref(), &chunk)?;
                for (line, outcome) in chunk.iter().zip(&outcomes) {
                    stats.lines += 1;
                    match outcome {
                        Outcome::Found(_) => stats.found += 1,
                        Outcome::NotFound => stats.not_found += 1,
                        Outcome::Invalid(_) => stats.invalid += 1,
                    }
                    output.row(&fields, line, outcome)?;
                }
                chunk.clear();
            }
            if !more {
                break;
            }
        }
    }
    output.finish()?;

    if show_stats {
        let elapsed = start.elapsed();
        let qps = stats.lines as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        eprintln!("[INFO] Lines:     {}", format_number(stats.lines));
        eprintln!("[INFO] Found:     {}", format_number(stats.found));
        eprintln!("[INFO] Not found: {}", format_number(stats.not_found));
        eprintln!("[INFO] Invalid:   {}", format_number(stats.invalid));
        eprintln!(
            "[INFO] Elapsed:   {:.2}ms ({} queries/sec)",
            elapsed.as_secs_f64() * 1000.0,
            format_qps(qps)
        );
    }

    Ok(())
}
