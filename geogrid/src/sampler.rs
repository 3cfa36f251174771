//! Elevation queries over a tiled DEM with on-demand grid loading.
//!
//! [`ElevationSampler`] answers point queries by finding the covering tile
//! in a [`TileIndex`], loading that tile's [`Grid`] through a
//! [`GridLoader`], and sampling it. Decoded grids are kept in a bounded
//! cache keyed by tile id.
//!
//! ```ignore
//! use geogrid::{ElevationSamplerBuilder, SampleMode};
//!
//! let sampler = ElevationSamplerBuilder::new("/data/dem_tifs")
//!     .cache_size(50)
//!     .build()?;
//!
//! if let Some(h) = sampler.elevation_at(34.785, 135.438, SampleMode::Bilinear)? {
//!     println!("Elevation: {:.2}m", h);
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;
use tracing::{debug, info, warn};

use crate::error::{GridError, Result};
use crate::geotiff::read_grid;
use crate::grid::{Grid, NodataPolicy, SampleMode};
use crate::index::{TileIndex, TileIndexEntry};

/// Nodata sentinel assumed for tiles without a `GDAL_NODATA` tag.
pub const DEFAULT_NODATA: f64 = -9999.0;

/// Default number of decoded grids kept in memory.
pub const DEFAULT_CACHE_SIZE: u64 = 100;

/// File name of the tile index inside the tile directory.
pub const DEFAULT_INDEX_FILE: &str = "dem_index.json";

/// Source of decoded grids for index entries.
pub trait GridLoader: Send + Sync {
    /// Load the grid for one tile.
    fn load(&self, entry: &TileIndexEntry) -> Result<Grid>;
}

impl<F> GridLoader for F
where
    F: Fn(&TileIndexEntry) -> Result<Grid> + Send + Sync,
{
    fn load(&self, entry: &TileIndexEntry) -> Result<Grid> {
        self(entry)
    }
}

/// Loads tiles as GeoTIFF files named by their tile id.
#[derive(Debug, Clone)]
pub struct GeoTiffDirectory {
    dir: PathBuf,
    default_nodata: f64,
}

impl GeoTiffDirectory {
    /// Read tiles from `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            default_nodata: DEFAULT_NODATA,
        }
    }

    /// Sentinel to use for files without a `GDAL_NODATA` tag.
    pub fn with_default_nodata(mut self, nodata: f64) -> Self {
        self.default_nodata = nodata;
        self
    }

    /// Directory holding the tiles.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl GridLoader for GeoTiffDirectory {
    fn load(&self, entry: &TileIndexEntry) -> Result<Grid> {
        read_grid(
            self.dir.join(&entry.tile_id),
            Some(entry.bounds),
            self.default_nodata,
        )
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of grids currently in the cache.
    pub entry_count: u64,
    /// Number of queries served from the cache.
    pub hit_count: u64,
    /// Number of grids loaded through the loader.
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Point elevation queries over a tile index.
///
/// Safe to share between threads. Concurrent queries for the same uncached
/// tile wait on a single load; different tiles load independently.
pub struct ElevationSampler {
    index: TileIndex,
    loader: Box<dyn GridLoader>,
    /// Decoded grids keyed by tile id; `None` when caching is disabled.
    cache: Option<Cache<String, Arc<Grid>>>,
    /// Overrides the nodata policy of every loaded grid.
    missing_threshold: Option<f64>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl ElevationSampler {
    /// Create a sampler over `index` using a custom loader.
    ///
    /// # Arguments
    ///
    /// * `index` - Tile footprints, searched in order
    /// * `loader` - Produces the grid for a tile
    /// * `cache_size` - Maximum number of grids kept in memory; 0 loads the
    ///   grid on every query
    pub fn with_loader<L>(index: TileIndex, loader: L, cache_size: u64) -> Self
    where
        L: GridLoader + 'static,
    {
        let cache = (cache_size > 0).then(|| Cache::builder().max_capacity(cache_size).build());

        Self {
            index,
            loader: Box::new(loader),
            cache,
            missing_threshold: None,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Create a builder reading GeoTIFF tiles from `tile_dir`.
    pub fn builder<P: AsRef<Path>>(tile_dir: P) -> ElevationSamplerBuilder {
        ElevationSamplerBuilder::new(tile_dir)
    }

    /// Treat every sample at or below `threshold` as missing, whatever the
    /// tile declares.
    pub fn with_missing_threshold(mut self, threshold: f64) -> Self {
        self.missing_threshold = Some(threshold);
        self
    }

    /// Elevation at a point.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(elevation))` - sampled value
    /// - `Ok(None)` - no tile covers the point, or the tile has no value there
    /// - `Err(GridError::TileLoad { .. })` - the covering tile failed to load
    pub fn elevation_at(&self, lat: f64, lon: f64, mode: SampleMode) -> Result<Option<f64>> {
        let Some(entry) = self.index.find_covering(lat, lon) else {
            return Ok(None);
        };

        let grid = self.load_tile(entry)?;
        Ok(grid.sample(lat, lon, mode))
    }

    /// Elevations for a batch of `(lat, lon)` points.
    ///
    /// Points are grouped by covering tile so that each tile is loaded once.
    /// Points without a value, or whose tile fails to load, get `default`.
    /// Results are in input order.
    pub fn elevations_batch(&self, coords: &[(f64, f64)], mode: SampleMode, default: f64) -> Vec<f64> {
        let mut results = vec![default; coords.len()];

        let mut groups: HashMap<&str, (&TileIndexEntry, Vec<usize>)> = HashMap::new();
        for (i, &(lat, lon)) in coords.iter().enumerate() {
            if let Some(entry) = self.index.find_covering(lat, lon) {
                groups
                    .entry(entry.tile_id.as_str())
                    .or_insert_with(|| (entry, Vec::new()))
                    .1
                    .push(i);
            }
        }

        for (entry, indices) in groups.into_values() {
            let grid = match self.load_tile(entry) {
                Ok(grid) => grid,
                Err(e) => {
                    warn!(tile = %entry.tile_id, points = indices.len(), error = %e, "skipping tile");
                    continue;
                }
            };

            for i in indices {
                let (lat, lon) = coords[i];
                if let Some(v) = grid.sample(lat, lon, mode) {
                    results[i] = v;
                }
            }
        }

        results
    }

    /// The tile a query at this point would use.
    pub fn covering_tile(&self, lat: f64, lon: f64) -> Option<&TileIndexEntry> {
        self.index.find_covering(lat, lon)
    }

    /// The tile index.
    pub fn index(&self) -> &TileIndex {
        &self.index
    }

    /// Load (or fetch from cache) the grid for a tile id in the index.
    ///
    /// Returns `Ok(None)` if the index has no such tile.
    pub fn grid(&self, tile_id: &str) -> Result<Option<Arc<Grid>>> {
        match self.index.get(tile_id) {
            Some(entry) => self.load_tile(entry).map(Some),
            None => Ok(None),
        }
    }

    /// Sample-at-or-below threshold applied to loaded grids, if any.
    pub fn missing_threshold(&self) -> Option<f64> {
        self.missing_threshold
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.cache.as_ref().map_or(0, |c| c.entry_count()),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// Get the maximum cache size; 0 when caching is disabled.
    pub fn cache_capacity(&self) -> u64 {
        self.cache
            .as_ref()
            .and_then(|c| c.policy().max_capacity())
            .unwrap_or(0)
    }

    /// Drop all cached grids.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }

    fn load_tile(&self, entry: &TileIndexEntry) -> Result<Arc<Grid>> {
        let Some(cache) = &self.cache else {
            return self
                .load_uncached(entry)
                .map_err(|e| GridError::tile_load(&entry.tile_id, Arc::new(e)));
        };

        if let Some(grid) = cache.get(&entry.tile_id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(grid);
        }

        // At most one load per tile id runs; other callers wait for it.
        // Failed loads are not cached.
        let mut loaded = false;
        let grid = cache
            .try_get_with(entry.tile_id.clone(), || {
                loaded = true;
                self.load_uncached(entry)
            })
            .map_err(|e| GridError::tile_load(&entry.tile_id, e))?;

        // Served by another caller's load.
        if !loaded {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(grid)
    }

    fn load_uncached(&self, entry: &TileIndexEntry) -> Result<Arc<Grid>> {
        self.miss_count.fetch_add(1, Ordering::Relaxed);
        debug!(tile = %entry.tile_id, "loading tile");

        let grid = self.loader.load(entry)?;
        let grid = match self.missing_threshold {
            Some(t) => grid.with_nodata_policy(NodataPolicy::AtOrBelow(t)),
            None => grid,
        };

        debug!(tile = %entry.tile_id, rows = grid.rows(), cols = grid.cols(), "tile loaded");
        Ok(Arc::new(grid))
    }
}

impl std::fmt::Debug for ElevationSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevationSampler")
            .field("tiles", &self.index.len())
            .field("cache_capacity", &self.cache_capacity())
            .field("missing_threshold", &self.missing_threshold)
            .finish_non_exhaustive()
    }
}

/// Builder for an [`ElevationSampler`] over a directory of GeoTIFF tiles.
///
/// # Example
///
/// ```ignore
/// use geogrid::ElevationSamplerBuilder;
///
/// let sampler = ElevationSamplerBuilder::new("/data/dem_tifs")
///     .index_path("/data/dem_index.json")
///     .cache_size(20)
///     .missing_threshold(-1000.0)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct ElevationSamplerBuilder {
    tile_dir: PathBuf,
    index_path: Option<PathBuf>,
    cache_size: u64,
    missing_threshold: Option<f64>,
    default_nodata: f64,
}

impl ElevationSamplerBuilder {
    /// Create a new builder with the specified tile directory.
    pub fn new<P: AsRef<Path>>(tile_dir: P) -> Self {
        Self {
            tile_dir: tile_dir.as_ref().to_path_buf(),
            index_path: None,
            cache_size: DEFAULT_CACHE_SIZE,
            missing_threshold: None,
            default_nodata: DEFAULT_NODATA,
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GEOGRID_TILE_DIR` | Directory containing GeoTIFF tiles | Required |
    /// | `GEOGRID_INDEX` | Tile index JSON | `<tile dir>/dem_index.json` |
    /// | `GEOGRID_CACHE_SIZE` | Maximum grids in cache (0 disables) | 100 |
    /// | `GEOGRID_MISSING_THRESHOLD` | Samples at or below are missing | None |
    ///
    /// # Errors
    ///
    /// Returns an error if `GEOGRID_TILE_DIR` is not set.
    pub fn from_env() -> Result<Self> {
        let tile_dir = std::env::var("GEOGRID_TILE_DIR")
            .map_err(|_| GridError::MissingConfig("GEOGRID_TILE_DIR environment variable not set"))?;

        let mut builder = Self::new(tile_dir);
        builder.index_path = std::env::var("GEOGRID_INDEX").ok().map(PathBuf::from);
        builder.cache_size = std::env::var("GEOGRID_CACHE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CACHE_SIZE);
        builder.missing_threshold = std::env::var("GEOGRID_MISSING_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok());

        Ok(builder)
    }

    /// Set the tile directory.
    pub fn tile_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.tile_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set the tile index path.
    ///
    /// Defaults to `dem_index.json` inside the tile directory.
    pub fn index_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.index_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the maximum number of grids to keep in cache.
    ///
    /// Default is 100 grids; 0 disables caching.
    pub fn cache_size(mut self, size: u64) -> Self {
        self.cache_size = size;
        self
    }

    /// Treat samples at or below `threshold` as missing.
    pub fn missing_threshold(mut self, threshold: f64) -> Self {
        self.missing_threshold = Some(threshold);
        self
    }

    /// Sentinel for tiles without a `GDAL_NODATA` tag.
    pub fn default_nodata(mut self, nodata: f64) -> Self {
        self.default_nodata = nodata;
        self
    }

    /// Resolved tile index path.
    pub fn resolved_index_path(&self) -> PathBuf {
        self.index_path
            .clone()
            .unwrap_or_else(|| self.tile_dir.join(DEFAULT_INDEX_FILE))
    }

    /// Load the tile index and build the [`ElevationSampler`].
    ///
    /// # Errors
    ///
    /// Returns an error if the tile index is missing or invalid.
    pub fn build(self) -> Result<ElevationSampler> {
        let index = TileIndex::from_file(self.resolved_index_path())?;
        let loader = GeoTiffDirectory::new(&self.tile_dir).with_default_nodata(self.default_nodata);

        info!(
            tile_dir = %self.tile_dir.display(),
            tiles = index.len(),
            cache_size = self.cache_size,
            "elevation sampler ready"
        );

        let mut sampler = ElevationSampler::with_loader(index, loader, self.cache_size);
        sampler.missing_threshold = self.missing_threshold;
        Ok(sampler)
    }
}
