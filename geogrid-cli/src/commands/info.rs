use anyhow::{Context, Result};
use geogrid::{NodataPolicy, PixelRegistration};

use super::SamplerOptions;

pub fn run(options: &SamplerOptions, tile_id: &str) -> Result<()> {
    let sampler = options.build_sampler()?;

    let entry = sampler
        .index()
        .get(tile_id)
        .with_context(|| format!("Tile not in index: {}", tile_id))?;
    let grid = sampler
        .grid(tile_id)
        .context("Failed to load tile")?
        .with_context(|| format!("Tile not in index: {}", tile_id))?;

    let tile_path = options.tile_dir()?.join(tile_id);
    let file_size = std::fs::metadata(&tile_path).map(|m| m.len()).ok();

    let (res_lon, res_lat) = grid.resolution();
    let bounds = grid.bounds();
    let stats = grid.stats();

    // Display information
    println!("Tile: {}", tile_id);
    println!("Path: {}", tile_path.display());
    println!();
    println!("Dimensions: {} cols x {} rows", grid.cols(), grid.rows());
    println!(
        "Resolution: {:.6}° x {:.6}° ({:.2}\" x {:.2}\")",
        res_lon,
        res_lat,
        res_lon * 3600.0,
        res_lat * 3600.0
    );
    println!(
        "Registration: {}",
        match grid.registration() {
            PixelRegistration::Area => "pixel is area",
            PixelRegistration::Point => "pixel is point",
        }
    );
    println!(
        "Index bounds: lat {:.6}..{:.6}, lon {:.6}..{:.6}",
        entry.bounds.min_lat, entry.bounds.max_lat, entry.bounds.min_lon, entry.bounds.max_lon
    );
    println!(
        "Grid bounds:  lat {:.6}..{:.6}, lon {:.6}..{:.6}",
        bounds.min_lat, bounds.max_lat, bounds.min_lon, bounds.max_lon
    );
    match grid.nodata_policy() {
        NodataPolicy::Exact(v) => println!("Nodata: {}", v),
        NodataPolicy::AtOrBelow(t) => println!("Nodata: values <= {}", t),
    }
    if let Some(size) = file_size {
        println!("File size: {}", format_size(size));
    }
    println!();

    if let (Some(min), Some(max)) = (stats.min, stats.max) {
        println!("Min elevation: {:.2}m", min);
        println!("Max elevation: {:.2}m", max);
    }

    if stats.missing_count > 0 {
        let total = stats.valid_count + stats.missing_count;
        let missing_pct = (stats.missing_count as f64 / total as f64) * 100.0;
        println!("Missing samples: {} ({:.1}%)", stats.missing_count, missing_pct);
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
