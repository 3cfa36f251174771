//! End-to-end queries over GeoTIFF tiles, a JSON index and a geoid file on disk.

use std::fs::File;
use std::path::Path;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use geogrid::{
    BoundingBox, ElevationSamplerBuilder, GeoidModel, GridError, NodataPolicy, PixelRegistration,
    SampleMode,
};
use tempfile::TempDir;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

/// Write a north-up float32 GeoTIFF with tiepoint, pixel scale and nodata tags.
fn write_tile(path: &Path, cols: u32, rows: u32, data: &[f32], west: f64, north: f64, step: f64) {
    write_tile_with_nodata(path, cols, rows, data, (west, north, step), "-9999");
}

fn write_tile_with_nodata(
    path: &Path,
    cols: u32,
    rows: u32,
    data: &[f32],
    (west, north, step): (f64, f64, f64),
    nodata: &str,
) {
    let file = File::create(path).unwrap();
    let mut tiff = TiffEncoder::new(file).unwrap();
    let mut image = tiff
        .new_image::<colortype::Gray32Float>(cols, rows)
        .unwrap();

    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &[step, step, 0.0][..])
        .unwrap();
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &[0.0, 0.0, 0.0, west, north, 0.0][..])
        .unwrap();
    image.encoder().write_tag(Tag::GdalNodata, nodata).unwrap();
    image.write_data(data).unwrap();
}

const INDEX: &str = r#"{
  "tile_a.tif": {"min_lon": 135.0, "min_lat": 35.0, "max_lon": 136.0, "max_lat": 36.0},
  "tile_b.tif": {"min_lon": 136.0, "min_lat": 35.0, "max_lon": 137.0, "max_lat": 36.0},
  "tile_missing.tif": {"min_lon": 137.0, "min_lat": 35.0, "max_lon": 138.0, "max_lat": 36.0}
}"#;

const GEOID: &str = r#"begin_of_head ================================================
model name     = TESTGEO
data units     = meters
lat min        =   35°00'00"
lon min        =  135°00'00"
delta lat      =    0°30'00"
delta lon      =    0°30'00"
nrows          =          3
ncols          =          3
nodata         = -9999.0000
end_of_head ==================================================
  38.0  38.0  38.0
  37.0  37.0  37.0
  36.0  36.0  36.0
"#;

/// Tile directory with two good tiles, an index naming a third that does
/// not exist, and a geoid file.
fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();

    write_tile(
        &dir.path().join("tile_a.tif"),
        2,
        2,
        &[100.0, 200.0, 300.0, 400.0],
        135.0,
        36.0,
        0.5,
    );

    // 4×4 ramp rising eastwards, with one nodata cell in the SE corner.
    let mut ramp: Vec<f32> = (0..16).map(|i| (i % 4) as f32 * 10.0).collect();
    ramp[15] = -9999.0;
    write_tile(&dir.path().join("tile_b.tif"), 4, 4, &ramp, 136.0, 36.0, 0.25);

    std::fs::write(dir.path().join("dem_index.json"), INDEX).unwrap();
    std::fs::write(dir.path().join("geoid.isg"), GEOID).unwrap();
    dir
}

#[test]
fn test_tile_center_bilinear() {
    let dir = fixture();
    let sampler = ElevationSamplerBuilder::new(dir.path()).build().unwrap();

    let h = sampler
        .elevation_at(35.5, 135.5, SampleMode::Bilinear)
        .unwrap();
    assert_eq!(h, Some(250.0));

    let h = sampler
        .elevation_at(35.9, 135.9, SampleMode::Nearest)
        .unwrap();
    assert_eq!(h, Some(200.0));
}

#[test]
fn test_ramp_tile_interpolation() {
    let dir = fixture();
    let sampler = ElevationSamplerBuilder::new(dir.path()).build().unwrap();

    // Cell centres sit at 136.125, 136.375, ... and step 10 m each.
    let h = sampler
        .elevation_at(35.5, 136.25, SampleMode::Bilinear)
        .unwrap()
        .unwrap();
    assert_abs_diff_eq!(h, 5.0, epsilon = 1e-9);

    let h = sampler
        .elevation_at(35.6, 136.6, SampleMode::Bilinear)
        .unwrap()
        .unwrap();
    assert_relative_eq!(h, 19.0, max_relative = 1e-9);

    // Any neighbour of the nodata cell makes bilinear unavailable.
    assert_eq!(
        sampler
            .elevation_at(35.2, 136.8, SampleMode::Bilinear)
            .unwrap(),
        None
    );
    assert_eq!(
        sampler
            .elevation_at(35.1, 136.9, SampleMode::Nearest)
            .unwrap(),
        None
    );
}

#[test]
fn test_edge_band_and_outside() {
    let dir = fixture();
    let sampler = ElevationSamplerBuilder::new(dir.path()).build().unwrap();

    // Beyond the last sample centre of tile_a there is nothing to blend.
    assert_eq!(
        sampler
            .elevation_at(35.9, 135.9, SampleMode::Bilinear)
            .unwrap(),
        None
    );
    assert_eq!(
        sampler
            .elevation_at(10.0, 10.0, SampleMode::Bilinear)
            .unwrap(),
        None
    );
}

#[test]
fn test_missing_tile_file_is_a_load_error() {
    let dir = fixture();
    let sampler = ElevationSamplerBuilder::new(dir.path()).build().unwrap();

    let err = sampler
        .elevation_at(35.5, 137.5, SampleMode::Nearest)
        .unwrap_err();
    match err {
        GridError::TileLoad { tile_id, source } => {
            assert_eq!(tile_id, "tile_missing.tif");
            assert!(matches!(*source, GridError::FileNotFound { .. }));
        }
        other => panic!("expected TileLoad, got {:?}", other),
    }

    // The batch path degrades the same failure to the default value.
    let results = sampler.elevations_batch(
        &[(35.5, 135.5), (35.5, 137.5), (35.9, 135.9)],
        SampleMode::Bilinear,
        f64::NAN,
    );
    assert_eq!(results[0], 250.0);
    assert!(results[1].is_nan());
    assert!(results[2].is_nan());
}

#[test]
fn test_grid_metadata_from_geotiff() {
    let dir = fixture();
    let sampler = ElevationSamplerBuilder::new(dir.path()).build().unwrap();

    let grid = sampler.grid("tile_b.tif").unwrap().unwrap();
    assert_eq!((grid.rows(), grid.cols()), (4, 4));
    assert_eq!(grid.registration(), PixelRegistration::Area);
    assert_eq!(grid.resolution(), (0.25, 0.25));
    assert_eq!(grid.bounds(), sampler.index().get("tile_b.tif").unwrap().bounds);

    let stats = grid.stats();
    assert_eq!(stats.valid_count, 15);
    assert_eq!(stats.missing_count, 1);
    assert_eq!(stats.min, Some(0.0));
    assert_eq!(stats.max, Some(30.0));
}

#[test]
fn test_missing_threshold_from_builder() {
    let dir = fixture();
    let sampler = ElevationSamplerBuilder::new(dir.path())
        .missing_threshold(150.0)
        .cache_size(0)
        .build()
        .unwrap();

    assert_eq!(
        sampler
            .elevation_at(35.9, 135.1, SampleMode::Nearest)
            .unwrap(),
        None
    );
    assert_eq!(
        sampler
            .elevation_at(35.9, 135.9, SampleMode::Nearest)
            .unwrap(),
        Some(200.0)
    );
}

#[test]
fn test_ellipsoidal_height_with_geoid() {
    let dir = fixture();
    let sampler = ElevationSamplerBuilder::new(dir.path()).build().unwrap();
    let geoid = GeoidModel::from_file(dir.path().join("geoid.isg")).unwrap();

    let (lat, lon) = (35.5, 135.5);
    let h = sampler
        .elevation_at(lat, lon, SampleMode::Bilinear)
        .unwrap()
        .unwrap();
    let n = geoid.height_at(lat, lon).unwrap();

    // Geoid rows are 36 m at 35.0°N and 37 m at 35.5°N.
    assert_abs_diff_eq!(n, 37.0, epsilon = 1e-9);
    assert_abs_diff_eq!(h + n, 287.0, epsilon = 1e-9);

    let n = geoid.height_at(35.25, 135.25).unwrap();
    assert_abs_diff_eq!(n, 36.5, epsilon = 1e-9);
    assert_eq!(geoid.height_at(36.0, 135.25), None);
}

#[test]
fn test_explicit_index_path() {
    let dir = fixture();
    let index_path = dir.path().join("elsewhere.json");
    std::fs::rename(dir.path().join("dem_index.json"), &index_path).unwrap();

    assert!(ElevationSamplerBuilder::new(dir.path()).build().is_err());

    let sampler = ElevationSamplerBuilder::new(dir.path())
        .index_path(&index_path)
        .build()
        .unwrap();
    assert_eq!(sampler.index().len(), 3);
}

#[test]
fn test_file_georeferencing_and_nodata_override_index() {
    let dir = TempDir::new().unwrap();

    // The index claims a 2°×2° footprint; the file itself covers 1°×1°.
    write_tile_with_nodata(
        &dir.path().join("tile_c.tif"),
        2,
        2,
        &[-32768.0, 10.0, 20.0, 30.0],
        (138.0, 36.0, 0.5),
        "-32768",
    );
    std::fs::write(
        dir.path().join("dem_index.json"),
        r#"{"tile_c.tif": {"min_lon": 138.0, "min_lat": 34.0, "max_lon": 140.0, "max_lat": 36.0}}"#,
    )
    .unwrap();

    let sampler = ElevationSamplerBuilder::new(dir.path()).build().unwrap();

    let grid = sampler.grid("tile_c.tif").unwrap().unwrap();
    assert_eq!(grid.bounds(), BoundingBox::new(35.0, 138.0, 36.0, 139.0).unwrap());
    assert_eq!(grid.nodata_policy(), NodataPolicy::Exact(-32768.0));

    // The declared sentinel is missing, not an elevation.
    assert_eq!(
        sampler
            .elevation_at(35.9, 138.1, SampleMode::Nearest)
            .unwrap(),
        None
    );
    assert_eq!(
        sampler
            .elevation_at(35.25, 138.75, SampleMode::Nearest)
            .unwrap(),
        Some(30.0)
    );

    // Inside the index footprint but outside the file's own extent.
    assert_eq!(
        sampler
            .elevation_at(34.5, 139.5, SampleMode::Nearest)
            .unwrap(),
        None
    );
}
