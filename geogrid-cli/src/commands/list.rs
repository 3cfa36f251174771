use anyhow::Result;

use super::SamplerOptions;

pub fn run(options: &SamplerOptions) -> Result<()> {
    let sampler = options.build_sampler()?;
    let index = sampler.index();

    if index.is_empty() {
        println!("No tiles in index");
        return Ok(());
    }

    let width = index
        .iter()
        .map(|e| e.tile_id.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!(
        "{:<width$} {:>11} {:>11} {:>12} {:>12}",
        "TILE",
        "MIN_LAT",
        "MAX_LAT",
        "MIN_LON",
        "MAX_LON",
        width = width
    );
    println!("{}", "-".repeat(width + 50));

    for entry in index {
        let b = &entry.bounds;
        println!(
            "{:<width$} {:>11.6} {:>11.6} {:>12.6} {:>12.6}",
            entry.tile_id,
            b.min_lat,
            b.max_lat,
            b.min_lon,
            b.max_lon,
            width = width
        );
    }

    println!("{}", "-".repeat(width + 50));
    println!("Total: {} tiles", index.len());
    if let Some(b) = index.bounds() {
        println!(
            "Coverage: lat {:.6}..{:.6}, lon {:.6}..{:.6}",
            b.min_lat, b.max_lat, b.min_lon, b.max_lon
        );
    }

    Ok(())
}
