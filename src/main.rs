use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use filehasher::{
    compute_text_hash, utils, Algorithm, BatchCoordinator, HashRecord, HasherConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filehasher")]
#[command(author, version, about = "Compute MD5 / SHA-1 / SHA-256 / SHA-512 digests")]
struct Cli {
    /// Hash algorithm: md5, sha1, sha256 or sha512
    #[arg(short, long, global = true, default_value = "sha256")]
    algorithm: Algorithm,

    /// Read buffer size in bytes
    #[arg(long, global = true, default_value_t = filehasher::config::DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Progress polling interval in milliseconds
    #[arg(long, global = true, default_value_t = 100)]
    poll_ms: u64,

    /// Log task lifecycle to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a piece of text
    Text {
        text: String,
        /// Reference hash to compare against
        #[arg(long)]
        compare: Option<String>,
    },
    /// Hash one or more files concurrently
    Files {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Reference hash to compare each digest against
        #[arg(long)]
        compare: Option<String>,
        /// Show full paths instead of file names
        #[arg(long)]
        full_path: bool,
        /// Print results as JSON once the batch finishes
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = HasherConfig::default()
        .with_buffer_size(cli.buffer_size)
        .with_poll_interval(Duration::from_millis(cli.poll_ms));

    let ok = match cli.command {
        Commands::Text { text, compare } => hash_text(cli.algorithm, &text, compare.as_deref()),
        Commands::Files {
            paths,
            compare,
            full_path,
            json,
        } => hash_files(config, cli.algorithm, paths, compare.as_deref(), full_path, json).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn hash_text(algorithm: Algorithm, text: &str, compare: Option<&str>) -> bool {
    let digest = compute_text_hash(algorithm, text);
    println!("{digest}");
    match compare {
        Some(reference) => report_comparison(algorithm, &digest, reference),
        None => true,
    }
}

async fn hash_files(
    config: HasherConfig,
    algorithm: Algorithm,
    paths: Vec<PathBuf>,
    compare: Option<&str>,
    full_path: bool,
    json: bool,
) -> Result<bool> {
    let mut batch = BatchCoordinator::new(config);
    batch.submit(&paths, algorithm);

    let pb = ProgressBar::new(batch.progress().total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%)")?
            .progress_chars("=>-"),
    );

    let mut ticker = tokio::time::interval(config.poll_interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stopping = false;
    let mut printed = HashSet::new();
    let mut ok = true;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let progress = batch.progress();
                pb.set_length(progress.total);
                pb.set_position(progress.current);
                if batch.is_drained() {
                    break;
                }
            }
            Some(record) = batch.next_completed() => {
                if !json {
                    ok &= print_record(&pb, &record, algorithm, compare, full_path);
                }
                printed.insert(record.id);
            }
            _ = &mut ctrl_c => {
                if stopping {
                    pb.abandon();
                    std::process::exit(130);
                }
                stopping = true;
                pb.suspend(|| eprintln!("stopping... press Ctrl-C again to quit"));
                batch.stop_all();
                ctrl_c.set(tokio::signal::ctrl_c());
            }
        }
    }
    pb.finish_and_clear();

    let records = batch.drain();
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        for record in &records {
            ok &= match (record.digest.as_deref(), compare) {
                (Some(digest), Some(reference)) => utils::hashes_match(digest, reference),
                (Some(_), None) => true,
                (None, _) => false,
            };
        }
    } else {
        // open failures never start, and late finishers may not have been reported yet
        for record in records.iter().filter(|r| !printed.contains(&r.id)) {
            ok &= print_record(&pb, record, algorithm, compare, full_path);
        }
    }
    Ok(ok)
}

fn print_record(
    pb: &ProgressBar,
    record: &HashRecord,
    algorithm: Algorithm,
    compare: Option<&str>,
    full_path: bool,
) -> bool {
    let shown = if full_path {
        record.file_path.display().to_string()
    } else {
        record.file_name.clone()
    };
    pb.suspend(|| println!("{}  {}", record.display_result(), shown));

    let Some(digest) = record.digest.as_deref() else {
        return false;
    };
    match compare {
        Some(reference) => report_comparison(algorithm, digest, reference),
        None => true,
    }
}

fn report_comparison(algorithm: Algorithm, digest: &str, reference: &str) -> bool {
    let normalized = utils::normalize_pasted_hash(reference);
    if normalized.len() != algorithm.hex_len() {
        eprintln!(
            "warning: reference is {} characters, {} digests are {}",
            normalized.len(),
            algorithm,
            algorithm.hex_len()
        );
    }
    let matched = utils::hashes_match(digest, &normalized);
    eprintln!("{}", if matched { "hash matches" } else { "HASH DIFFERS" });
    matched
}
