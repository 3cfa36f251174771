use anyhow::{Context, Result};
use geogrid::GeoidModel;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct GeoidResponse<'a> {
    lat: f64,
    lon: f64,
    geoid_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

pub fn run(geoid_file: Option<PathBuf>, lat: f64, lon: f64, json: bool) -> Result<()> {
    let path = geoid_file.context(
        "GEOGRID_GEOID_FILE environment variable not set. Use --geoid-file or set GEOGRID_GEOID_FILE",
    )?;

    let geoid = GeoidModel::from_file(&path)
        .with_context(|| format!("Failed to load geoid file {}", path.display()))?;

    let height = geoid.height_at(lat, lon);

    if json {
        let response = GeoidResponse {
            lat,
            lon,
            geoid_height: height,
            model: geoid.header().model_name.as_deref(),
        };
        println!("{}", serde_json::to_string(&response)?);
    } else if let Some(h) = height {
        println!("{:.4}", h);
    } else {
        println!("void");
    }

    Ok(())
}
