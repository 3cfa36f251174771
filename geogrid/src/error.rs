//! Error types for the geogrid library.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur when loading or sampling grids.
///
/// A point that simply has no value (outside every tile, on the unusable
/// edge row/column, or next to a nodata sample) is not an error: sampling
/// functions report it as `None`.
#[derive(Error, Debug)]
pub enum GridError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// A tile, index or geoid file does not exist.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Loading the grid for a tile failed during a query.
    #[error("Failed to load tile {tile_id}: {source}")]
    TileLoad {
        tile_id: String,
        #[source]
        source: Arc<GridError>,
    },

    /// Grid dimensions must both be at least one.
    #[error("Invalid grid dimensions: {cols} cols x {rows} rows")]
    InvalidDimensions { cols: usize, rows: usize },

    /// Sample buffer length does not match `rows * cols`.
    #[error("Grid data holds {actual} samples, expected {expected}")]
    DataLength { expected: usize, actual: usize },

    /// The affine transform cannot be inverted.
    #[error("Degenerate affine transform (determinant {determinant})")]
    DegenerateTransform { determinant: f64 },

    /// A bounding box with `min >= max` on some axis, or non-finite values.
    #[error("Invalid bounds for {name}: lat {min_lat}..{max_lat}, lon {min_lon}..{max_lon}")]
    InvalidBounds {
        name: String,
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    },

    /// The tile index file could not be parsed.
    #[error("Invalid tile index: {0}")]
    IndexParse(#[from] serde_json::Error),

    /// GeoTIFF without usable georeferencing or layout.
    #[error("Invalid GeoTIFF: {0}")]
    InvalidGeoTiff(String),

    /// Sample format the decoder cannot widen to `f64`.
    #[error("Unsupported TIFF data type: {0}")]
    UnsupportedDataType(String),

    /// Malformed geoid header or body line.
    #[error("Geoid file line {line}: {message}")]
    Header { line: usize, message: String },

    /// A required geoid header field was never seen.
    #[error("Geoid header is missing required field '{0}'")]
    MissingHeaderField(&'static str),

    /// Angle text that is neither `D°M'S"` nor a decimal number.
    #[error("Invalid angle: {0:?}")]
    InvalidAngle(String),

    /// Geoid body row count differs from the declared `nrows`.
    #[error("Geoid body has {actual} rows, header declares {expected}")]
    RowCountMismatch { expected: usize, actual: usize },

    /// A geoid body row has the wrong number of values.
    #[error("Geoid body row {row} has {actual} values, header declares {expected}")]
    ColumnCountMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Required configuration was not provided.
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
}

impl GridError {
    /// Wrap a load failure with the tile it belongs to.
    pub(crate) fn tile_load(tile_id: &str, source: Arc<GridError>) -> Self {
        GridError::TileLoad {
            tile_id: tile_id.to_string(),
            source,
        }
    }
}

/// Result type alias using [`GridError`].
pub type Result<T> = std::result::Result<T, GridError>;
