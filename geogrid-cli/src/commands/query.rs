use anyhow::{Context, Result};
use serde::Serialize;

use super::{sample_mode, SamplerOptions};

#[derive(Serialize)]
struct ElevationResponse<'a> {
    lat: f64,
    lon: f64,
    elevation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tile: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    interpolated: bool,
}

pub fn run(options: &SamplerOptions, lat: f64, lon: f64, interpolate: bool, json: bool) -> Result<()> {
    let sampler = options.build_sampler()?;

    let elevation = sampler
        .elevation_at(lat, lon, sample_mode(interpolate))
        .context("Failed to get elevation")?;

    if json {
        let response = ElevationResponse {
            lat,
            lon,
            elevation,
            tile: sampler.covering_tile(lat, lon).map(|e| e.tile_id.as_str()),
            interpolated: interpolate,
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        match elevation {
            Some(elev) if interpolate => println!("{:.2}", elev),
            Some(elev) => println!("{}", elev),
            None => println!("void"),
        }
    }

    Ok(())
}
