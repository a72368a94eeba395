use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use rusty_predictor::data::sample::generate_sample_csv;

const DEFAULT_ROWS: usize = 100;
const SEED: u64 = 42;

/// Usage: `generate_sample [OUTPUT_PATH] [ROWS]`
fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data.csv"));
    let rows = match args.next() {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("row count '{raw}' is not a positive integer"))?,
        None => DEFAULT_ROWS,
    };

    let csv = generate_sample_csv(rows, SEED);
    std::fs::write(&output_path, csv)
        .with_context(|| format!("writing {}", output_path.display()))?;
    info!("sample generated with seed {SEED}");

    println!("Wrote {rows} rows to {}", output_path.display());
    Ok(())
}
