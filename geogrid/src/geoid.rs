//! Geoid undulation model read from an ISG-style text grid.
//!
//! The file has a free-form preamble, a `key = value` header between
//! `begin_of_head` and `end_of_head`, and then `nrows` lines of `ncols`
//! whitespace-separated heights. The first body line is the northernmost
//! row:
//!
//! ```text
//! begin_of_head ================================================
//! model name     = JPGEO2024
//! lat min        =   20°00'00"
//! lon min        =  120°00'00"
//! delta lat      =    0°01'00"
//! delta lon      =    0°01'30"
//! nrows          =       1801
//! ncols          =       1601
//! nodata         = -9999.0000
//! end_of_head ==================================================
//!  36.1234  36.2345 ...
//! ```
//!
//! Heights are sampled with bilinear interpolation between the four
//! surrounding grid nodes.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use std::str::FromStr;

use tracing::info;

use crate::bounds::BoundingBox;
use crate::error::{GridError, Result};
use crate::grid::{Grid, NodataPolicy, PixelRegistration};
use crate::transform::AffineTransform;

/// Parsed header of a geoid grid file.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoidHeader {
    /// Latitude of the southernmost row, in degrees.
    pub lat0: f64,
    /// Longitude of the westernmost column, in degrees.
    pub lon0: f64,
    /// Row spacing in degrees.
    pub dlat: f64,
    /// Column spacing in degrees.
    pub dlon: f64,
    /// Number of body rows.
    pub nrows: usize,
    /// Number of values per body row.
    pub ncols: usize,
    /// Sentinel marking nodes without a height.
    pub nodata: f64,
    /// `model name`, if the header has one.
    pub model_name: Option<String>,
    /// `data units`, if the header has one.
    pub units: Option<String>,
}

#[derive(Default)]
struct HeaderFields {
    lat0: Option<f64>,
    lon0: Option<f64>,
    dlat: Option<f64>,
    dlon: Option<f64>,
    nrows: Option<usize>,
    ncols: Option<usize>,
    nodata: Option<f64>,
    model_name: Option<String>,
    units: Option<String>,
}

impl HeaderFields {
    fn set(&mut self, key: &str, value: &str, line: usize) -> Result<()> {
        let bad = |e: &dyn std::fmt::Display| GridError::Header {
            line,
            message: format!("{}: {}", key, e),
        };

        match key {
            "lat min" => self.lat0 = Some(parse_angle(value).map_err(|e| bad(&e))?),
            "lon min" => self.lon0 = Some(parse_angle(value).map_err(|e| bad(&e))?),
            "delta lat" => self.dlat = Some(parse_angle(value).map_err(|e| bad(&e))?),
            "delta lon" => self.dlon = Some(parse_angle(value).map_err(|e| bad(&e))?),
            "nrows" => self.nrows = Some(value.parse::<usize>().map_err(|e| bad(&e))?),
            "ncols" => self.ncols = Some(value.parse::<usize>().map_err(|e| bad(&e))?),
            "nodata" => self.nodata = Some(value.parse::<f64>().map_err(|e| bad(&e))?),
            "model name" => self.model_name = Some(value.to_string()),
            "data units" => self.units = Some(value.to_string()),
            _ => {}
        }
        Ok(())
    }

    fn finish(self, line: usize) -> Result<GeoidHeader> {
        let header = GeoidHeader {
            lat0: self.lat0.ok_or(GridError::MissingHeaderField("lat min"))?,
            lon0: self.lon0.ok_or(GridError::MissingHeaderField("lon min"))?,
            dlat: self.dlat.ok_or(GridError::MissingHeaderField("delta lat"))?,
            dlon: self.dlon.ok_or(GridError::MissingHeaderField("delta lon"))?,
            nrows: self.nrows.ok_or(GridError::MissingHeaderField("nrows"))?,
            ncols: self.ncols.ok_or(GridError::MissingHeaderField("ncols"))?,
            nodata: self.nodata.ok_or(GridError::MissingHeaderField("nodata"))?,
            model_name: self.model_name,
            units: self.units,
        };

        if !(header.dlat > 0.0 && header.dlon > 0.0) {
            return Err(GridError::Header {
                line,
                message: format!(
                    "grid spacing must be positive (delta lat {}, delta lon {})",
                    header.dlat, header.dlon
                ),
            });
        }

        Ok(header)
    }
}

/// Parse an angle given as `D°M'S"` or as decimal degrees.
///
/// Seconds may be fractional and the value may carry a leading sign.
///
/// ```
/// use geogrid::geoid::parse_angle;
///
/// assert_eq!(parse_angle("20°00'00\"")?, 20.0);
/// assert_eq!(parse_angle("-0°30'00\"")?, -0.5);
/// assert_eq!(parse_angle("135.25")?, 135.25);
/// # Ok::<(), geogrid::GridError>(())
/// ```
pub fn parse_angle(text: &str) -> Result<f64> {
    let invalid = || GridError::InvalidAngle(text.to_string());
    let s = text.trim();

    if !s.contains('°') {
        return s
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(invalid);
    }

    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };

    let (deg, rest) = body.split_once('°').ok_or_else(invalid)?;
    let (min, rest) = rest.split_once('\'').ok_or_else(invalid)?;
    let sec = rest.trim().strip_suffix('"').ok_or_else(invalid)?;

    let deg: u32 = deg.trim().parse().map_err(|_| invalid())?;
    let min: u32 = min.trim().parse().map_err(|_| invalid())?;
    let sec: f64 = sec.trim().parse().map_err(|_| invalid())?;

    if min >= 60 || !(0.0..60.0).contains(&sec) {
        return Err(invalid());
    }

    Ok(sign * (f64::from(deg) + f64::from(min) / 60.0 + sec / 3600.0))
}

/// A geoid model backed by a single regular grid.
///
/// # Example
///
/// ```ignore
/// use geogrid::GeoidModel;
///
/// let geoid = GeoidModel::from_file("JPGEO2024.isg")?;
/// if let Some(n) = geoid.height_at(34.785, 135.438) {
///     println!("Geoid height: {:.3} m", n);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct GeoidModel {
    header: GeoidHeader,
    grid: Grid,
}

impl GeoidModel {
    /// Load a model from a geoid grid file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, the header is incomplete,
    /// or the body does not match the declared dimensions.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => GridError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => GridError::Io(e),
        })?;

        let model = Self::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), "loaded geoid file");
        Ok(model)
    }

    /// Parse a model from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines().enumerate();

        // Header
        let mut fields = HeaderFields::default();
        let mut header = None;
        for (i, line) in lines.by_ref() {
            let line = line?;
            let line = line.trim();
            let line_no = i + 1;

            if line.starts_with("begin_of_head") {
                // Anything before the header proper is commentary.
                fields = HeaderFields::default();
            } else if line.starts_with("end_of_head") {
                header = Some(std::mem::take(&mut fields).finish(line_no)?);
                break;
            } else if let Some((key, value)) = line.split_once('=') {
                fields.set(key.trim(), value.trim(), line_no)?;
            }
        }
        let header = header.ok_or(GridError::MissingHeaderField("end_of_head"))?;

        // Body, north to south
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (i, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let row = line
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>().map_err(|_| GridError::Header {
                        line: i + 1,
                        message: format!("invalid value {:?}", tok),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;

            if row.len() != header.ncols {
                return Err(GridError::ColumnCountMismatch {
                    row: rows.len(),
                    expected: header.ncols,
                    actual: row.len(),
                });
            }
            rows.push(row);
        }

        if rows.len() != header.nrows {
            return Err(GridError::RowCountMismatch {
                expected: header.nrows,
                actual: rows.len(),
            });
        }

        // Row 0 becomes the southernmost row at lat0.
        rows.reverse();
        let transform =
            AffineTransform::new(header.dlon, 0.0, header.lon0, 0.0, header.dlat, header.lat0)?;
        let grid = Grid::from_rows(rows, transform, NodataPolicy::Exact(header.nodata))?
            .with_registration(PixelRegistration::Point);

        info!(
            model = header.model_name.as_deref().unwrap_or("unnamed"),
            lat0 = header.lat0,
            lon0 = header.lon0,
            dlat = header.dlat,
            dlon = header.dlon,
            nrows = header.nrows,
            ncols = header.ncols,
            "parsed geoid grid"
        );

        Ok(Self { header, grid })
    }

    /// Geoid height at a point, in the file's data units.
    ///
    /// Returns `None` outside the usable grid (the last row and column only
    /// serve as interpolation neighbours) or when any of the four
    /// surrounding nodes is nodata.
    pub fn height_at(&self, lat: f64, lon: f64) -> Option<f64> {
        self.grid.sample_bilinear(lat, lon)
    }

    /// The parsed header.
    pub fn header(&self) -> &GeoidHeader {
        &self.header
    }

    /// The underlying grid; row 0 is the southernmost row.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Extent spanned by the grid nodes.
    pub fn bounds(&self) -> BoundingBox {
        let h = &self.header;
        BoundingBox {
            min_lat: h.lat0,
            max_lat: h.lat0 + (h.nrows - 1) as f64 * h.dlat,
            min_lon: h.lon0,
            max_lon: h.lon0 + (h.ncols - 1) as f64 * h.dlon,
        }
    }
}

impl FromStr for GeoidModel {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes())
    }
}
