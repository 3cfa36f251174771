use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::{sample_mode, SamplerOptions};

/// Points sampled per batch call; each batch loads its tiles once.
const CHUNK_SIZE: usize = 1000;

pub fn run(
    options: &SamplerOptions,
    input: PathBuf,
    output: Option<PathBuf>,
    lat_col: String,
    lon_col: String,
    interpolate: bool,
) -> Result<()> {
    let sampler = options.build_sampler()?;

    let file = File::open(&input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    // Find column indices
    let headers = reader.headers()?.clone();
    let lat_idx = headers
        .iter()
        .position(|h| h == lat_col)
        .with_context(|| format!("Column '{}' not found in CSV", lat_col))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == lon_col)
        .with_context(|| format!("Column '{}' not found in CSV", lon_col))?;

    let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;

    let coords = records
        .iter()
        .enumerate()
        .map(|(i, record)| -> Result<(f64, f64)> {
            let lat: f64 = record
                .get(lat_idx)
                .context("Missing latitude")?
                .trim()
                .parse()
                .with_context(|| format!("Invalid latitude on row {}", i + 1))?;
            let lon: f64 = record
                .get(lon_idx)
                .context("Missing longitude")?
                .trim()
                .parse()
                .with_context(|| format!("Invalid longitude on row {}", i + 1))?;
            Ok((lat, lon))
        })
        .collect::<Result<Vec<(f64, f64)>>>()?;

    let pb = ProgressBar::new(coords.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    // NaN marks points without a value.
    let mode = sample_mode(interpolate);
    let mut elevations = Vec::with_capacity(coords.len());
    for chunk in coords.chunks(CHUNK_SIZE) {
        elevations.extend(sampler.elevations_batch(chunk, mode, f64::NAN));
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("done");

    // Prepare output
    let output_path = output.unwrap_or_else(|| default_output_path(&input));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    // Write header
    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push("elevation");
    writer.write_record(&new_headers)?;

    let mut void_count = 0usize;
    for (record, elevation) in records.iter().zip(&elevations) {
        let elevation = if elevation.is_nan() {
            void_count += 1;
            "void".to_string()
        } else if interpolate {
            format!("{:.2}", elevation)
        } else {
            elevation.to_string()
        };

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&elevation);
        writer.write_record(&new_record)?;
    }
    writer.flush()?;

    println!("Output written to: {}", output_path.display());
    if void_count > 0 {
        println!("Points without data: {} of {}", void_count, records.len());
    }
    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_elevation.csv", stem))
}
