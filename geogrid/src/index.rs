//! Tile index: which tile covers which part of the map.
//!
//! The index is a JSON object written by an external builder, one member
//! per tile file:
//!
//! ```json
//! {
//!   "FG-GML-5235-45-DEM5A.tif": {
//!     "min_lon": 135.5, "min_lat": 34.75, "max_lon": 135.5625, "max_lat": 34.8
//!   }
//! }
//! ```
//!
//! Member order is kept; it decides which tile wins when tiles overlap.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::bounds::BoundingBox;
use crate::error::{GridError, Result};

/// One tile of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct TileIndexEntry {
    /// Tile identifier, normally the raster file name.
    pub tile_id: String,
    /// Geographic footprint of the tile.
    pub bounds: BoundingBox,
}

impl TileIndexEntry {
    /// Create an entry.
    pub fn new(tile_id: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            tile_id: tile_id.into(),
            bounds,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawBounds {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

/// Ordered collection of tile footprints.
///
/// Lookups scan entries in insertion order; the first entry whose bounds
/// contain the point (edges included) wins.
#[derive(Debug, Clone, Default)]
pub struct TileIndex {
    entries: Vec<TileIndexEntry>,
    /// tile_id -> position in `entries`.
    positions: HashMap<String, usize>,
}

impl TileIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from entries, keeping their order.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = TileIndexEntry>,
    {
        let mut index = Self::new();
        for entry in entries {
            index.push(entry);
        }
        index
    }

    /// Load an index from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::FileNotFound`] if the file does not exist, and a
    /// parse or bounds error if its content is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GridError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => GridError::Io(e),
        })?;

        let index = Self::from_json_str(&text)?;
        info!(path = %path.display(), tiles = index.len(), "loaded tile index");
        Ok(index)
    }

    /// Parse an index from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let members: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;

        let mut index = Self::new();
        for (tile_id, value) in members {
            let raw: RawBounds = serde_json::from_value(value)?;
            let bounds =
                BoundingBox::named(&tile_id, raw.min_lat, raw.min_lon, raw.max_lat, raw.max_lon)?;
            index.push(TileIndexEntry { tile_id, bounds });
        }

        Ok(index)
    }

    /// Append an entry.
    ///
    /// An entry whose id is already present replaces the old bounds but
    /// keeps the old position.
    pub fn push(&mut self, entry: TileIndexEntry) {
        match self.positions.get(&entry.tile_id) {
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.positions
                    .insert(entry.tile_id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Look up an entry by tile id.
    pub fn get(&self, tile_id: &str) -> Option<&TileIndexEntry> {
        self.positions.get(tile_id).map(|&pos| &self.entries[pos])
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TileIndexEntry> {
        self.entries.iter()
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index has no tiles.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First tile whose bounds contain the point.
    pub fn find_covering(&self, lat: f64, lon: f64) -> Option<&TileIndexEntry> {
        self.entries.iter().find(|e| e.bounds.contains(lat, lon))
    }

    /// Every tile whose bounds contain the point, in index order.
    pub fn find_all_covering(&self, lat: f64, lon: f64) -> Vec<&TileIndexEntry> {
        self.entries
            .iter()
            .filter(|e| e.bounds.contains(lat, lon))
            .collect()
    }

    /// Union of all tile footprints, or `None` for an empty index.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut iter = self.entries.iter();
        let first = iter.next()?.bounds;
        Some(iter.fold(first, |acc, e| acc.union(&e.bounds)))
    }
}

impl<'a> IntoIterator for &'a TileIndex {
    type Item = &'a TileIndexEntry;
    type IntoIter = std::slice::Iter<'a, TileIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
