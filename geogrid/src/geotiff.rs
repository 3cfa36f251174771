//! GeoTIFF tile decoding.
//!
//! Tiles are single-band GeoTIFFs. The file is memory-mapped and decoded
//! with the `tiff` crate; every sample type is widened to `f64`.
//!
//! Georeferencing is read from, in order of preference:
//!
//! 1. `ModelTransformationTag` (34264)
//! 2. `ModelTiepointTag` (33922) with `ModelPixelScaleTag` (33550)
//! 3. Caller-supplied bounds (normally the tile index entry)
//!
//! The nodata sentinel comes from the `GDAL_NODATA` tag (42113).

use std::fs::File;
use std::io::{Cursor, ErrorKind, Read, Seek};
use std::path::Path;

use memmap2::Mmap;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::ColorType;

use crate::bounds::BoundingBox;
use crate::error::{GridError, Result};
use crate::grid::{Grid, NodataPolicy, PixelRegistration};
use crate::transform::AffineTransform;

const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const RASTER_PIXEL_IS_POINT: u16 = 2;

/// Decoder buffer ceiling; large national DEM tiles exceed the defaults.
const BUFFER_LIMIT: usize = 1024 * 1024 * 1024;

/// Load a grid from a GeoTIFF file.
///
/// # Arguments
///
/// * `path` - Path to the `.tif` file
/// * `fallback_bounds` - Footprint to use when the file carries no
///   georeferencing tags
/// * `default_nodata` - Sentinel to use when the file has no `GDAL_NODATA`
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded, is not a
/// single-band image, or has no georeferencing and no fallback was given.
pub fn read_grid<P: AsRef<Path>>(
    path: P,
    fallback_bounds: Option<BoundingBox>,
    default_nodata: f64,
) -> Result<Grid> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => GridError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => GridError::Io(e),
    })?;

    // SAFETY: Memory mapping is safe as long as the file is not modified
    // while mapped. We open the file read-only and drop the mapping once
    // decoding finishes.
    let mmap = unsafe { Mmap::map(&file)? };

    decode_grid(Cursor::new(&mmap[..]), fallback_bounds, default_nodata)
}

/// Decode a grid from any seekable GeoTIFF byte source.
pub fn decode_grid<R: Read + Seek>(
    reader: R,
    fallback_bounds: Option<BoundingBox>,
    default_nodata: f64,
) -> Result<Grid> {
    let mut limits = Limits::default();
    limits.decoding_buffer_size = BUFFER_LIMIT;
    limits.intermediate_buffer_size = BUFFER_LIMIT;
    limits.ifd_value_size = BUFFER_LIMIT;
    let mut decoder = Decoder::new(reader)?.with_limits(limits);

    match decoder.colortype()? {
        ColorType::Gray(_) => {}
        other => {
            return Err(GridError::UnsupportedDataType(format!(
                "{:?} (expected a single band)",
                other
            )))
        }
    }

    let (width, height) = decoder.dimensions()?;
    let (cols, rows) = (width as usize, height as usize);

    let transform = read_transform(&mut decoder, cols, rows, fallback_bounds)?;
    let registration = read_registration(&mut decoder);
    let declared_nodata = read_nodata(&mut decoder);

    let (data, nodata) = widen_samples(decoder.read_image()?, declared_nodata, default_nodata);

    Ok(Grid::new(data, rows, cols, transform, NodataPolicy::Exact(nodata))?
        .with_registration(registration))
}

fn read_transform<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    cols: usize,
    rows: usize,
    fallback_bounds: Option<BoundingBox>,
) -> Result<AffineTransform> {
    // 4×4 row-major matrix; only the first two rows matter for 2D.
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::ModelTransformationTag) {
        if m.len() >= 8 {
            return AffineTransform::new(m[0], m[1], m[3], m[4], m[5], m[7]);
        }
    }

    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag);
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag);
    if let (Ok(tiepoint), Ok(scale)) = (tiepoint, scale) {
        if tiepoint.len() >= 6 && scale.len() >= 2 {
            // Tiepoint: [i, j, k, x, y, z] ties pixel (i, j) to (x, y).
            let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
            let (sx, sy) = (scale[0], scale[1]);
            return AffineTransform::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy);
        }
    }

    match fallback_bounds {
        Some(b) => AffineTransform::from_bounds(b.min_lon, b.min_lat, b.max_lon, b.max_lat, cols, rows),
        None => Err(GridError::InvalidGeoTiff(
            "no ModelTransformation or ModelTiepoint/ModelPixelScale tags".to_string(),
        )),
    }
}

/// `GTRasterTypeGeoKey` from the GeoKey directory; defaults to area.
fn read_registration<R: Read + Seek>(decoder: &mut Decoder<R>) -> PixelRegistration {
    let Ok(keys) = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag) else {
        return PixelRegistration::Area;
    };

    // Header is [version, revision, minor, count], then 4-value entries
    // of [key, location, count, value].
    let point = keys
        .get(4..)
        .unwrap_or_default()
        .chunks_exact(4)
        .any(|k| k[0] == GT_RASTER_TYPE_GEO_KEY && k[1] == 0 && k[3] == RASTER_PIXEL_IS_POINT);

    if point {
        PixelRegistration::Point
    } else {
        PixelRegistration::Area
    }
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder.get_tag_ascii_string(Tag::GdalNodata).ok()?;
    text.trim_end_matches('\0').trim().parse().ok()
}

/// Widen samples to `f64`, casting the sentinel through the file's sample
/// type so that exact comparison still holds after widening.
fn widen_samples(
    samples: DecodingResult,
    declared_nodata: Option<f64>,
    default_nodata: f64,
) -> (Vec<f64>, f64) {
    let nodata = declared_nodata.unwrap_or(default_nodata);

    match samples {
        DecodingResult::U8(v) => (v.into_iter().map(f64::from).collect(), nodata),
        DecodingResult::U16(v) => (v.into_iter().map(f64::from).collect(), nodata),
        DecodingResult::U32(v) => (v.into_iter().map(f64::from).collect(), nodata),
        DecodingResult::U64(v) => (v.into_iter().map(|s| s as f64).collect(), nodata),
        DecodingResult::I8(v) => (v.into_iter().map(f64::from).collect(), nodata),
        DecodingResult::I16(v) => (v.into_iter().map(f64::from).collect(), nodata),
        DecodingResult::I32(v) => (v.into_iter().map(f64::from).collect(), nodata),
        DecodingResult::I64(v) => (v.into_iter().map(|s| s as f64).collect(), nodata),
        DecodingResult::F32(v) => (
            v.into_iter().map(f64::from).collect(),
            f64::from(nodata as f32),
        ),
        DecodingResult::F64(v) => (v, nodata),
    }
}
