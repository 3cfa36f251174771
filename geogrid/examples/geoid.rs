//! Convert DEM elevations to ellipsoidal heights with a geoid model.
//!
//! Run with: cargo run --example geoid -- /path/to/dem_tifs /path/to/geoid.isg

use geogrid::{ElevationSamplerBuilder, GeoidModel, GridError, SampleMode};
use std::env;

fn main() -> Result<(), GridError> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: cargo run --example geoid -- /path/to/dem_tifs /path/to/geoid.isg");
        std::process::exit(1);
    }

    let sampler = ElevationSamplerBuilder::new(&args[1]).build()?;
    let geoid = GeoidModel::from_file(&args[2])?;

    let header = geoid.header();
    println!(
        "Geoid model: {} ({} x {} nodes)",
        header.model_name.as_deref().unwrap_or("unnamed"),
        header.nrows,
        header.ncols
    );

    let (lat, lon) = (34.785, 135.438);
    println!("Heights at ({}, {}):", lat, lon);
    println!("{:-<50}", "");

    let h = sampler.elevation_at(lat, lon, SampleMode::Bilinear)?;
    let n = geoid.height_at(lat, lon);

    match h {
        Some(h) => println!("Orthometric: {:.3}m", h),
        None => println!("Orthometric: no data"),
    }
    match n {
        Some(n) => println!("Geoid:       {:.3}m", n),
        None => println!("Geoid:       outside model"),
    }
    if let (Some(h), Some(n)) = (h, n) {
        println!("Ellipsoidal: {:.3}m", h + n);
    }

    Ok(())
}
