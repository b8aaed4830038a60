mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{cmd_batch, cmd_inspect, cmd_query, cmd_validate};

#[derive(Parser)]
#[command(name = "ipdb")]
#[command(
    about = "Offline IP geolocation lookups against IPDB database files",
    long_about = "ipdb - Query IPIP.net IPDB geolocation databases\n\n\
    Loads an IPDB file (memory-mapped) and resolves IPv4/IPv6 addresses to\n\
    their per-language location records.\n\n\
    Examples:\n\
      ipdb query city.ipdb 1.1.1.1\n\
      ipdb query city.ipdb 2001:250::1 --language EN --format full\n\
      ipdb inspect city.ipdb --json\n\
      ipdb validate city.ipdb --level strict\n\
      ipdb batch city.ipdb access-ips.txt.gz -j auto > out.ndjson"
)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a single IP address
    Query {
        /// Path to the IPDB database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// IPv4 or IPv6 address in textual form
        #[arg(value_name = "IP")]
        ip: String,

        /// Language block to return (default: CN if present, else the first language)
        #[arg(short, long)]
        language: Option<String>,

        /// Output format: pairs (default, field -> value), values (ordered array), or full
        #[arg(short, long, default_value = "pairs")]
        format: String,

        /// Quiet mode - no output, only exit code (0 = found, 1 = not found)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show database metadata
    Inspect {
        /// Path to the IPDB database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Output metadata as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Validate a database file for structural integrity
    Validate {
        /// Path to the IPDB database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Validation level: standard or strict (default)
        #[arg(short, long, default_value = "strict")]
        level: String,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Look up every address in one or more files (one address per line)
    Batch {
        /// Path to the IPDB database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Address lists (plain or .gz), or "-" for stdin
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Language block to return (default: CN if present, else the first language)
        #[arg(short, long)]
        language: Option<String>,

        /// Number of worker threads (default: 1, use "auto" for all cores)
        #[arg(short = 'j', long)]
        threads: Option<String>,

        /// Output format: json (default, NDJSON) or csv
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Show throughput statistics on stderr
        #[arg(short, long)]
        stats: bool,
    },
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Query {
            database,
            ip,
            language,
            format,
            quiet,
        } => cmd_query(database, ip, language, format, quiet),
        Commands::Inspect { database, json } => cmd_inspect(database, json),
        Commands::Validate {
            database,
            level,
            json,
        } => cmd_validate(database, level, json, cli.verbose > 0),
        Commands::Batch {
            database,
            inputs,
            language,
            threads,
            format,
            stats,
        } => cmd_batch(database, inputs, language, threads, format, stats),
    }
}
