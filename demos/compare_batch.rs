//! Example: Compare one reference recording against many candidates in parallel
//!
//! Usage:
//!   cargo run --release --example compare_batch -- [--jobs N] [--json] <reference> <candidate1> ...
//!
//! Notes:
//! - The reference melody is extracted once and shared by every worker.
//! - Parallelism is across candidates. Each comparison is single-threaded.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.

use rayon::prelude::*;
use std::env;
use std::path::Path;
use std::time::Instant;
use stratum_melody::{
    compare_melodies, extract_melody, AudioFormat, ComparisonConfig, ComparisonError,
    ComparisonResult, MelodySequence,
};

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(1)
}

fn load_melody(path: &str, config: &ComparisonConfig) -> Result<MelodySequence, String> {
    let format = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(AudioFormat::from_extension)
        .ok_or_else(|| "unsupported file extension".to_string())?;
    let bytes = std::fs::read(path).map_err(|e| format!("read failed: {e}"))?;
    extract_melody(&bytes, format, config).map_err(|e: ComparisonError| e.to_string())
}

struct ItemOut {
    path: String,
    result: Result<ComparisonResult, String>,
    processing_ms: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut paths: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: compare_batch [--jobs N] [--json] <reference> <candidate1> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.len() < 2 {
        eprintln!("ERROR: Provide a reference and at least one candidate. Use --help for usage.");
        std::process::exit(2);
    }

    let config = ComparisonConfig::default();
    let reference_path = paths.remove(0);
    let reference = load_melody(&reference_path, &config)?;

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!(
        "Batch: reference {} ({} notes), {} candidates, jobs={}",
        reference_path,
        reference.len(),
        paths.len(),
        jobs
    );

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<ItemOut> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let started = Instant::now();
                let result = load_melody(path, &config).and_then(|candidate| {
                    compare_melodies(&reference, &candidate, &config).map_err(|e| e.to_string())
                });
                ItemOut {
                    path: path.clone(),
                    result,
                    processing_ms: started.elapsed().as_secs_f64() * 1000.0,
                }
            })
            .collect()
    });

    for (idx, o) in outs.iter().enumerate() {
        match (&o.result, json) {
            (Ok(r), true) => println!(
                "{{\"file\":{},\"result\":{},\"processing_time_ms\":{:.2}}}",
                serde_json::to_string(&o.path)?,
                serde_json::to_string(r)?,
                o.processing_ms
            ),
            (Err(e), true) => println!(
                "{{\"file\":{},\"error\":{}}}",
                serde_json::to_string(&o.path)?,
                serde_json::to_string(e)?
            ),
            (Ok(r), false) => println!(
                "[{}/{}] {}: score={:.4} match={} time={:.2}ms",
                idx + 1,
                outs.len(),
                o.path,
                r.score,
                r.is_match,
                o.processing_ms
            ),
            (Err(e), false) => println!("[{}/{}] {}: ERROR: {}", idx + 1, outs.len(), o.path, e),
        }
    }

    let matches = outs
        .iter()
        .filter(|o| matches!(&o.result, Ok(r) if r.is_match))
        .count();
    eprintln!(
        "Done: matches={}/{} wall={:.0}ms",
        matches,
        outs.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}
