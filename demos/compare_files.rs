//! Example: Compare the melodies of two audio files
//!
//! Usage:
//!   cargo run --release --example compare_files -- [--json] [--threshold T] <file1> <file2>
//!
//! The format of each file is taken from its extension (wav, mp3, flac).

use std::env;
use std::path::Path;
use std::time::Instant;
use stratum_melody::{compare, AudioFormat, ComparisonConfig};

fn format_of(path: &str) -> Result<AudioFormat, Box<dyn std::error::Error>> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(AudioFormat::from_extension)
        .ok_or_else(|| format!("{}: unsupported file extension", path).into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut config = ComparisonConfig::default();
    let mut paths: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--threshold" => {
                let v = args
                    .first()
                    .ok_or("--threshold requires a value")?
                    .parse::<f32>()?;
                args.remove(0);
                config = config.with_threshold(v);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: compare_files [--json] [--threshold T] <file1> <file2>\n\
                     \n\
                     --threshold T   Match threshold in [0, 1] (default: 0.8)\n\
                     --json          Emit the result as JSON\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.len() != 2 {
        eprintln!("ERROR: Provide exactly two audio file paths. Use --help for usage.");
        std::process::exit(2);
    }

    let first = std::fs::read(&paths[0])?;
    let second = std::fs::read(&paths[1])?;

    let t0 = Instant::now();
    let result = compare(
        &first,
        format_of(&paths[0])?,
        &second,
        format_of(&paths[1])?,
        &config,
    )?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;

    if json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("Comparison Results:");
        println!("  {} vs {}", paths[0], paths[1]);
        println!("  Score: {:.4}", result.score);
        println!("  Match: {} (threshold {:.2})", result.is_match, result.threshold);
        println!("  Processing time: {:.2} ms", elapsed_ms);
    }

    Ok(())
}
