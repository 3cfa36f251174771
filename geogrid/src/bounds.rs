//! Geographic bounding boxes.

use crate::error::{GridError, Result};

/// A geographic bounding box in decimal degrees.
///
/// Always satisfies `min_lat < max_lat` and `min_lon < max_lon`; use
/// [`BoundingBox::new`] to construct one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum latitude (southern boundary).
    pub min_lat: f64,
    /// Maximum latitude (northern boundary).
    pub max_lat: f64,
    /// Minimum longitude (western boundary).
    pub min_lon: f64,
    /// Maximum longitude (eastern boundary).
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    ///
    /// # Arguments
    ///
    /// * `min_lat` - Southern boundary latitude
    /// * `min_lon` - Western boundary longitude
    /// * `max_lat` - Northern boundary latitude
    /// * `max_lon` - Eastern boundary longitude
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidBounds`] if a value is not finite or a
    /// minimum is not strictly below its maximum.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self> {
        Self::named("bounding box", min_lat, min_lon, max_lat, max_lon)
    }

    /// Like [`BoundingBox::new`], naming the owner in the error.
    pub(crate) fn named(
        name: &str,
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    ) -> Result<Self> {
        let finite = [min_lat, min_lon, max_lat, max_lon]
            .iter()
            .all(|v| v.is_finite());

        if !finite || min_lat >= max_lat || min_lon >= max_lon {
            return Err(GridError::InvalidBounds {
                name: name.to_string(),
                min_lat,
                max_lat,
                min_lon,
                max_lon,
            });
        }

        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    /// Check if a point lies inside the box, edges included.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.min_lat <= lat && lat <= self.max_lat && self.min_lon <= lon && lon <= self.max_lon
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    /// Height of the box in degrees of latitude.
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Width of the box in degrees of longitude.
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let bbox = BoundingBox::new(35.0, 135.0, 36.0, 136.0).unwrap();

        assert!(bbox.contains(35.5, 135.5));
        assert!(bbox.contains(35.0, 135.0)); // SW corner
        assert!(bbox.contains(36.0, 136.0)); // NE corner
        assert!(bbox.contains(36.0, 135.5)); // north edge
        assert!(!bbox.contains(34.999, 135.5));
        assert!(!bbox.contains(35.5, 136.001));
    }

    #[test]
    fn test_rejects_inverted_or_empty() {
        assert!(BoundingBox::new(36.0, 135.0, 35.0, 136.0).is_err());
        assert!(BoundingBox::new(35.0, 136.0, 36.0, 135.0).is_err());
        assert!(BoundingBox::new(35.0, 135.0, 35.0, 136.0).is_err());
        assert!(BoundingBox::new(f64::NAN, 135.0, 36.0, 136.0).is_err());
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(35.0, 135.0, 36.0, 136.0).unwrap();
        let b = BoundingBox::new(34.5, 135.5, 35.5, 137.0).unwrap();
        let u = a.union(&b);

        assert_eq!(u.min_lat, 34.5);
        assert_eq!(u.max_lat, 36.0);
        assert_eq!(u.min_lon, 135.0);
        assert_eq!(u.max_lon, 137.0);
        assert_eq!(u.lat_span(), 1.5);
        assert_eq!(u.lon_span(), 2.0);
    }
}
