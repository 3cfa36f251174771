//! Basic example demonstrating geogrid library usage.
//!
//! Run with: cargo run --example basic -- /path/to/dem_tifs

use geogrid::{ElevationSamplerBuilder, GridError, SampleMode};
use std::env;

fn main() -> Result<(), GridError> {
    // Get tile directory from command line
    let tile_dir = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/dem_tifs");
        std::process::exit(1);
    });

    // Index is read from <tile_dir>/dem_index.json
    let sampler = ElevationSamplerBuilder::new(&tile_dir).cache_size(10).build()?;

    let locations = [
        ("Osaka Castle", 34.6873, 135.5262),
        ("Mount Rokko", 34.7780, 135.2636),
        ("Kansai Airport", 34.4320, 135.2304),
    ];

    println!("Elevation queries:");
    println!("{:-<60}", "");

    for (name, lat, lon) in &locations {
        let nearest = sampler.elevation_at(*lat, *lon, SampleMode::Nearest);
        let bilinear = sampler.elevation_at(*lat, *lon, SampleMode::Bilinear);

        match (nearest, bilinear) {
            (Ok(Some(n)), Ok(Some(b))) => println!("{}: {:.1}m (bilinear {:.2}m)", name, n, b),
            (Ok(Some(n)), Ok(None)) => println!("{}: {:.1}m (bilinear unavailable)", name, n),
            (Ok(None), _) => println!("{}: no data", name),
            (Err(e), _) | (_, Err(e)) => println!("{}: error - {}", name, e),
        }
    }

    // Show cache statistics
    let stats = sampler.cache_stats();
    println!("\nCache statistics:");
    println!("  Cached tiles: {}", stats.entry_count);
    println!("  Hits: {}", stats.hit_count);
    println!("  Misses: {}", stats.miss_count);
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    Ok(())
}
