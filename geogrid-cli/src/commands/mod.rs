pub mod batch;
pub mod geoid;
pub mod info;
pub mod list;
pub mod query;

use anyhow::{Context, Result};
use geogrid::{ElevationSampler, ElevationSamplerBuilder, SampleMode};
use std::path::PathBuf;

/// Global options shared by commands that read the tile index.
pub struct SamplerOptions {
    pub tile_dir: Option<PathBuf>,
    pub index: Option<PathBuf>,
    pub cache_size: u64,
    pub missing_threshold: Option<f64>,
}

impl SamplerOptions {
    pub fn tile_dir(&self) -> Result<&PathBuf> {
        self.tile_dir.as_ref().context(
            "GEOGRID_TILE_DIR environment variable not set. Use --tile-dir or set GEOGRID_TILE_DIR",
        )
    }

    pub fn builder(&self) -> Result<ElevationSamplerBuilder> {
        let mut builder = ElevationSamplerBuilder::new(self.tile_dir()?).cache_size(self.cache_size);

        if let Some(index) = &self.index {
            builder = builder.index_path(index);
        }
        if let Some(threshold) = self.missing_threshold {
            builder = builder.missing_threshold(threshold);
        }

        Ok(builder)
    }

    pub fn build_sampler(&self) -> Result<ElevationSampler> {
        let builder = self.builder()?;
        let index_path = builder.resolved_index_path();
        builder
            .build()
            .with_context(|| format!("Failed to load tile index {}", index_path.display()))
    }
}

pub fn sample_mode(interpolate: bool) -> SampleMode {
    if interpolate {
        SampleMode::Bilinear
    } else {
        SampleMode::Nearest
    }
}
