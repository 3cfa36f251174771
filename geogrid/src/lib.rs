//! # geogrid - Tiled DEM and Geoid Sampling
//!
//! Point queries against digital elevation models split into GeoTIFF tiles,
//! and against geoid undulation grids distributed as ISG-style text files.
//!
//! ## Features
//!
//! - **Tile index**: JSON footprint index, first match wins on overlaps
//! - **Lazy loading**: tiles are decoded on first use and kept in a bounded
//!   cache, with at most one load in flight per tile
//! - **Sampling**: nearest-cell or bilinear, with per-grid nodata policies
//! - **Geoid**: `D°M'S"` header parsing and bilinear height lookup
//!
//! ## Quick Start
//!
//! ```ignore
//! use geogrid::{ElevationSamplerBuilder, GeoidModel, SampleMode};
//!
//! let sampler = ElevationSamplerBuilder::new("/data/dem_tifs").build()?;
//! let geoid = GeoidModel::from_file("/data/JPGEO2024.isg")?;
//!
//! let (lat, lon) = (34.785, 135.438);
//! let h = sampler.elevation_at(lat, lon, SampleMode::Bilinear)?;
//! let n = geoid.height_at(lat, lon);
//!
//! if let (Some(h), Some(n)) = (h, n) {
//!     println!("Orthometric {:.2}m, ellipsoidal {:.2}m", h, h + n);
//! }
//! ```
//!
//! ## Grid Orientation
//!
//! Every [`Grid`] maps pixel coordinates to `(lon, lat)` through an
//! [`AffineTransform`]. North-up tiles built from bounds put row 0 at the
//! northern edge; the geoid grid is stored south-first and uses a transform
//! with a positive row step instead.
//!
//! Missing data is `Ok(None)`, never an error. Errors are reserved for
//! broken input: unreadable tiles, malformed indices or geoid files.

pub mod bounds;
pub mod error;
pub mod geoid;
pub mod geotiff;
pub mod grid;
pub mod index;
pub mod sampler;
pub mod transform;

// Re-export main types at crate root for convenience
pub use bounds::BoundingBox;
pub use error::{GridError, Result};
pub use geoid::{GeoidHeader, GeoidModel};
pub use grid::{Grid, GridStats, NodataPolicy, PixelRegistration, SampleMode};
pub use index::{TileIndex, TileIndexEntry};
pub use sampler::{
    CacheStats, ElevationSampler, ElevationSamplerBuilder, GeoTiffDirectory, GridLoader,
    DEFAULT_NODATA,
};
pub use transform::AffineTransform;
