//! Affine mapping between pixel and geographic coordinates.
//!
//! Coefficients follow the usual `(a, b, c, d, e, f)` layout:
//!
//! ```text
//! lon = a * col + b * row + c
//! lat = d * col + e * row + f
//! ```
//!
//! For a north-up raster `e` is negative, so row 0 is the northern edge.

use crate::error::{GridError, Result};

/// An invertible affine transform from `(col, row)` to `(lon, lat)`.
///
/// The inverse coefficients are computed once at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    forward: [f64; 6],
    inverse: [f64; 4],
}

impl AffineTransform {
    /// Create a transform from its six coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DegenerateTransform`] if a coefficient is not
    /// finite or the linear part has a zero determinant.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<Self> {
        let determinant = a * e - b * d;
        let finite = [a, b, c, d, e, f].iter().all(|v| v.is_finite());

        if !finite || !determinant.is_finite() || determinant == 0.0 {
            return Err(GridError::DegenerateTransform { determinant });
        }

        Ok(Self {
            forward: [a, b, c, d, e, f],
            inverse: [
                e / determinant,
                -b / determinant,
                -d / determinant,
                a / determinant,
            ],
        })
    }

    /// Build a north-up transform covering the given bounds.
    ///
    /// Column 0 maps to `min_lon` and column `cols` to `max_lon`; row 0 maps
    /// to `max_lat` and row `rows` to `min_lat`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] if `cols` or `rows` is zero,
    /// and [`GridError::DegenerateTransform`] if the bounds have no extent.
    pub fn from_bounds(
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
        cols: usize,
        rows: usize,
    ) -> Result<Self> {
        if cols == 0 || rows == 0 {
            return Err(GridError::InvalidDimensions { cols, rows });
        }

        let pixel_width = (max_lon - min_lon) / cols as f64;
        let pixel_height = (max_lat - min_lat) / rows as f64;

        Self::new(pixel_width, 0.0, min_lon, 0.0, -pixel_height, max_lat)
    }

    /// Map pixel coordinates to `(lon, lat)`.
    pub fn forward(&self, col: f64, row: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.forward;
        (a * col + b * row + c, d * col + e * row + f)
    }

    /// Map `(lon, lat)` to fractional `(col, row)` pixel coordinates.
    ///
    /// The result is not rounded.
    pub fn inverse(&self, lon: f64, lat: f64) -> (f64, f64) {
        let [_, _, c, _, _, f] = self.forward;
        let [ia, ib, id, ie] = self.inverse;
        let (x, y) = (lon - c, lat - f);
        (ia * x + ib * y, id * x + ie * y)
    }

    /// The six forward coefficients `(a, b, c, d, e, f)`.
    pub fn coefficients(&self) -> [f64; 6] {
        self.forward
    }

    /// Pixel size along columns and rows, in degrees.
    pub fn pixel_size(&self) -> (f64, f64) {
        let [a, b, _, d, e, _] = self.forward;
        (a.hypot(d), b.hypot(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_from_bounds_corners() {
        let t = AffineTransform::from_bounds(135.0, 35.0, 136.0, 36.0, 4, 2).unwrap();

        assert_eq!(t.forward(0.0, 0.0), (135.0, 36.0)); // NW
        assert_eq!(t.forward(4.0, 2.0), (136.0, 35.0)); // SE
        assert_eq!(t.forward(4.0, 0.0), (136.0, 36.0)); // NE
        assert_eq!(t.forward(0.0, 2.0), (135.0, 35.0)); // SW
    }

    #[test]
    fn test_inverse_is_fractional() {
        let t = AffineTransform::from_bounds(135.0, 35.0, 136.0, 36.0, 4, 2).unwrap();
        let (col, row) = t.inverse(135.375, 35.25);

        assert_abs_diff_eq!(col, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(row, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_undoes_forward_with_rotation() {
        let t = AffineTransform::new(0.01, 0.002, 10.0, -0.001, -0.02, 50.0).unwrap();

        for &(col, row) in &[(0.0, 0.0), (12.5, 3.25), (-4.0, 100.0)] {
            let (lon, lat) = t.forward(col, row);
            let (c, r) = t.inverse(lon, lat);
            assert_abs_diff_eq!(c, col, epsilon = 1e-9);
            assert_abs_diff_eq!(r, row, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            AffineTransform::from_bounds(135.0, 35.0, 136.0, 36.0, 0, 2),
            Err(GridError::InvalidDimensions { cols: 0, rows: 2 })
        ));
        assert!(AffineTransform::from_bounds(135.0, 35.0, 136.0, 36.0, 2, 0).is_err());
    }

    #[test]
    fn test_degenerate_rejected() {
        // Zero-width bounds.
        assert!(matches!(
            AffineTransform::from_bounds(135.0, 35.0, 135.0, 36.0, 2, 2),
            Err(GridError::DegenerateTransform { .. })
        ));
        // Collinear rows and columns.
        assert!(AffineTransform::new(1.0, 2.0, 0.0, 2.0, 4.0, 0.0).is_err());
        assert!(AffineTransform::new(f64::NAN, 0.0, 0.0, 0.0, -1.0, 0.0).is_err());
    }

    #[test]
    fn test_pixel_size() {
        let t = AffineTransform::from_bounds(135.0, 35.0, 136.0, 36.0, 4, 2).unwrap();
        assert_eq!(t.pixel_size(), (0.25, 0.5));
    }
}
