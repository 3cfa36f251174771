//! Scalar grids with an affine geo-transform and point sampling.
//!
//! A [`Grid`] owns a fixed `rows × cols` block of samples in row-major
//! order. Which geographic direction row 0 faces is decided entirely by the
//! grid's [`AffineTransform`]: [`Grid::from_bounds`] builds a north-up grid
//! (row 0 is the northern edge), while a transform with a positive `e`
//! coefficient makes row 0 the southern edge.
//!
//! Two sampling modes are provided:
//!
//! - **Nearest**: the value of the cell containing the point.
//! - **Bilinear**: a blend of the four sample nodes surrounding the point.
//!   The last row and column are never used as the anchor of a blend, so a
//!   point beyond the last node returns `None` instead of extrapolating. If
//!   any of the four nodes is missing the whole sample is `None`.

use crate::bounds::BoundingBox;
use crate::error::{GridError, Result};
use crate::transform::AffineTransform;

/// How a grid marks samples that carry no measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodataPolicy {
    /// A sample equal to the sentinel is missing.
    Exact(f64),
    /// Any sample at or below the threshold is missing.
    AtOrBelow(f64),
}

impl NodataPolicy {
    /// Returns `true` if `value` is a missing sample under this policy.
    ///
    /// Non-finite samples are missing under every policy.
    pub fn is_missing(&self, value: f64) -> bool {
        if !value.is_finite() {
            return true;
        }
        match *self {
            NodataPolicy::Exact(sentinel) => value == sentinel,
            NodataPolicy::AtOrBelow(threshold) => value <= threshold,
        }
    }
}

/// Whether the transform addresses cell corners or sample nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelRegistration {
    /// Integer pixel coordinates are cell corners; each sample sits at the
    /// centre of its cell (GeoTIFF `PixelIsArea`).
    #[default]
    Area,
    /// Integer pixel coordinates are the samples themselves (GeoTIFF
    /// `PixelIsPoint`).
    Point,
}

/// Point sampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Value of the containing cell.
    Nearest,
    /// Bilinear blend of the four surrounding nodes.
    Bilinear,
}

/// Summary of a grid's sample values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridStats {
    /// Smallest valid sample, if any.
    pub min: Option<f64>,
    /// Largest valid sample, if any.
    pub max: Option<f64>,
    /// Number of samples that are not missing.
    pub valid_count: u64,
    /// Number of missing samples.
    pub missing_count: u64,
}

/// A rectangular grid of scalar samples.
///
/// # Example
///
/// ```
/// use geogrid::{BoundingBox, Grid, NodataPolicy, SampleMode};
///
/// let bounds = BoundingBox::new(35.0, 135.0, 36.0, 136.0)?;
/// let grid = Grid::from_bounds(
///     vec![100.0, 200.0, 300.0, 400.0],
///     2,
///     2,
///     bounds,
///     NodataPolicy::Exact(-9999.0),
/// )?;
///
/// assert_eq!(grid.sample(35.5, 135.5, SampleMode::Bilinear), Some(250.0));
/// assert_eq!(grid.sample(35.9, 135.9, SampleMode::Nearest), Some(200.0));
/// # Ok::<(), geogrid::GridError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Grid {
    /// Samples in row-major order.
    data: Vec<f64>,
    rows: usize,
    cols: usize,
    transform: AffineTransform,
    registration: PixelRegistration,
    nodata: NodataPolicy,
}

impl Grid {
    /// Create a grid from row-major samples.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero or `data.len()` is not
    /// `rows * cols`.
    pub fn new(
        data: Vec<f64>,
        rows: usize,
        cols: usize,
        transform: AffineTransform,
        nodata: NodataPolicy,
    ) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GridError::InvalidDimensions { cols, rows });
        }
        let expected = rows * cols;
        if data.len() != expected {
            return Err(GridError::DataLength {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            rows,
            cols,
            transform,
            registration: PixelRegistration::Area,
            nodata,
        })
    }

    /// Create a north-up grid whose cells exactly cover `bounds`.
    pub fn from_bounds(
        data: Vec<f64>,
        rows: usize,
        cols: usize,
        bounds: BoundingBox,
        nodata: NodataPolicy,
    ) -> Result<Self> {
        let transform = AffineTransform::from_bounds(
            bounds.min_lon,
            bounds.min_lat,
            bounds.max_lon,
            bounds.max_lat,
            cols,
            rows,
        )?;
        Self::new(data, rows, cols, transform, nodata)
    }

    /// Create a grid from nested rows, rejecting ragged input.
    pub fn from_rows(
        rows: Vec<Vec<f64>>,
        transform: AffineTransform,
        nodata: NodataPolicy,
    ) -> Result<Self> {
        let row_count = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((row, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(GridError::ColumnCountMismatch {
                row,
                expected: cols,
                actual: bad.len(),
            });
        }

        let data = rows.into_iter().flatten().collect();
        Self::new(data, row_count, cols, transform, nodata)
    }

    /// Set how the transform addresses samples.
    pub fn with_registration(mut self, registration: PixelRegistration) -> Self {
        self.registration = registration;
        self
    }

    /// Replace the missing-data policy.
    pub fn with_nodata_policy(mut self, nodata: NodataPolicy) -> Self {
        self.nodata = nodata;
        self
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The pixel-to-geographic transform.
    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    /// Pixel registration of the transform.
    pub fn registration(&self) -> PixelRegistration {
        self.registration
    }

    /// The missing-data policy.
    pub fn nodata_policy(&self) -> NodataPolicy {
        self.nodata
    }

    /// Raw sample at `(row, col)`, or `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Sample the grid at a geographic point.
    pub fn sample(&self, lat: f64, lon: f64, mode: SampleMode) -> Option<f64> {
        match mode {
            SampleMode::Nearest => self.sample_nearest(lat, lon),
            SampleMode::Bilinear => self.sample_bilinear(lat, lon),
        }
    }

    /// Value of the cell containing the point.
    ///
    /// Returns `None` outside the grid or when the cell is missing.
    pub fn sample_nearest(&self, lat: f64, lon: f64) -> Option<f64> {
        let (col_f, row_f) = self.cell_coords(lat, lon);
        let (col, row) = (col_f.floor(), row_f.floor());

        // Float comparisons also reject NaN.
        if !(col >= 0.0 && col < self.cols as f64 && row >= 0.0 && row < self.rows as f64) {
            return None;
        }

        let value = self.data[row as usize * self.cols + col as usize];
        if self.nodata.is_missing(value) {
            None
        } else {
            Some(value)
        }
    }

    /// Bilinear blend of the four nodes around the point.
    ///
    /// Returns `None` when the anchor node falls on the last row or column
    /// (or outside the grid), or when any of the four nodes is missing.
    pub fn sample_bilinear(&self, lat: f64, lon: f64) -> Option<f64> {
        let (col_f, row_f) = self.node_coords(lat, lon);
        let (col0, row0) = (col_f.floor(), row_f.floor());

        if !(col0 >= 0.0
            && col0 < (self.cols - 1) as f64
            && row0 >= 0.0
            && row0 < (self.rows - 1) as f64)
        {
            return None;
        }

        let (c0, r0) = (col0 as usize, row0 as usize);
        let top = r0 * self.cols + c0;
        let bottom = top + self.cols;
        let corners = [
            self.data[top],
            self.data[top + 1],
            self.data[bottom],
            self.data[bottom + 1],
        ];

        if corners.iter().any(|&z| self.nodata.is_missing(z)) {
            return None;
        }

        let [z00, z01, z10, z11] = corners;
        Some(bilinear(z00, z01, z10, z11, col_f - col0, row_f - row0))
    }

    /// Geographic footprint covered by the grid's cells.
    pub fn bounds(&self) -> BoundingBox {
        let (lo, hi_c, hi_r) = match self.registration {
            PixelRegistration::Area => (0.0, self.cols as f64, self.rows as f64),
            PixelRegistration::Point => {
                (-0.5, self.cols as f64 - 0.5, self.rows as f64 - 0.5)
            }
        };

        let corners = [
            self.transform.forward(lo, lo),
            self.transform.forward(hi_c, lo),
            self.transform.forward(lo, hi_r),
            self.transform.forward(hi_c, hi_r),
        ];

        let mut bbox = BoundingBox {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
        };
        for (lon, lat) in corners {
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lat = bbox.max_lat.max(lat);
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.max_lon = bbox.max_lon.max(lon);
        }
        bbox
    }

    /// Resolution in degrees per pixel as `(lon, lat)`.
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.pixel_size()
    }

    /// Scan every sample and summarise valid and missing values.
    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats::default();

        for &value in &self.data {
            if self.nodata.is_missing(value) {
                stats.missing_count += 1;
                continue;
            }
            stats.valid_count += 1;
            stats.min = Some(stats.min.map_or(value, |m| m.min(value)));
            stats.max = Some(stats.max.map_or(value, |m| m.max(value)));
        }

        stats
    }

    /// Pixel coordinates in which integer values are cell corners.
    fn cell_coords(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (col, row) = self.transform.inverse(lon, lat);
        match self.registration {
            PixelRegistration::Area => (snap(col), snap(row)),
            PixelRegistration::Point => (snap(col + 0.5), snap(row + 0.5)),
        }
    }

    /// Pixel coordinates in which integer values are sample nodes.
    fn node_coords(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (col, row) = self.transform.inverse(lon, lat);
        match self.registration {
            PixelRegistration::Area => (snap(col - 0.5), snap(row - 0.5)),
            PixelRegistration::Point => (snap(col), snap(row)),
        }
    }
}

/// Pixel coordinates closer than this to an integer are snapped onto it,
/// so that points given at a node survive the round-off of the inverse
/// transform.
const SNAP_EPSILON: f64 = 1e-9;

fn snap(v: f64) -> f64 {
    let nearest = v.round();
    if (v - nearest).abs() < SNAP_EPSILON {
        nearest
    } else {
        v
    }
}

/// Weighted sum of four corners at fractional offset `(dx, dy)`.
///
/// `z00` is the anchor, `z01` its column neighbour, `z10` its row neighbour.
pub(crate) fn bilinear(z00: f64, z01: f64, z10: f64, z11: f64, dx: f64, dy: f64) -> f64 {
    z00 * (1.0 - dx) * (1.0 - dy) + z01 * dx * (1.0 - dy) + z10 * (1.0 - dx) * dy + z11 * dx * dy
}
