use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geogrid::{
    BoundingBox, ElevationSampler, Grid, NodataPolicy, SampleMode, TileIndex, TileIndexEntry,
};

const SAMPLES: usize = 1201;

/// Synthetic 1°×1° tile with a simple elevation gradient.
fn gradient_tile(entry: &TileIndexEntry) -> geogrid::Result<Grid> {
    let data = (0..SAMPLES * SAMPLES)
        .map(|i| ((i / SAMPLES + i % SAMPLES) % 4000) as f64)
        .collect();
    Grid::from_bounds(
        data,
        SAMPLES,
        SAMPLES,
        entry.bounds,
        NodataPolicy::Exact(-9999.0),
    )
}

/// Sampler over 1° tiles with south-west corners at the given points.
fn sampler(corners: &[(f64, f64)]) -> ElevationSampler {
    let index = TileIndex::from_entries(corners.iter().map(|&(lat, lon)| {
        let bounds = BoundingBox::new(lat, lon, lat + 1.0, lon + 1.0).unwrap();
        TileIndexEntry::new(format!("tile_{}_{}.tif", lat, lon), bounds)
    }));
    ElevationSampler::with_loader(index, gradient_tile, 10)
}

fn bench_single_nearest(c: &mut Criterion) {
    let sampler = sampler(&[(35.0, 138.0)]);

    // Warm the cache
    let _ = sampler.elevation_at(35.5, 138.5, SampleMode::Nearest);

    c.bench_function("single_nearest_cached", |b| {
        b.iter(|| {
            black_box(
                sampler
                    .elevation_at(black_box(35.3606), black_box(138.7274), SampleMode::Nearest)
                    .unwrap(),
            );
        });
    });
}

fn bench_single_bilinear(c: &mut Criterion) {
    let sampler = sampler(&[(35.0, 138.0)]);

    // Warm the cache
    let _ = sampler.elevation_at(35.5, 138.5, SampleMode::Bilinear);

    c.bench_function("single_bilinear_cached", |b| {
        b.iter(|| {
            black_box(
                sampler
                    .elevation_at(black_box(35.3606), black_box(138.7274), SampleMode::Bilinear)
                    .unwrap(),
            );
        });
    });
}

fn bench_batch_multi_tile(c: &mut Criterion) {
    let sampler = sampler(&[(35.0, 138.0), (36.0, 138.0), (35.0, 139.0)]);

    // Generate 1000 coords spread across 3 tiles
    let coords: Vec<(f64, f64)> = (0..1000)
        .map(|i| match i % 3 {
            0 => (35.0 + (i as f64 / 3000.0) * 0.99, 138.5),
            1 => (36.0 + (i as f64 / 3000.0) * 0.99, 138.5),
            _ => (35.0 + (i as f64 / 3000.0) * 0.99, 139.5),
        })
        .collect();

    // Warm the cache
    let _ = sampler.elevations_batch(&coords, SampleMode::Bilinear, 0.0);

    c.bench_function("batch_1000_multi_tile", |b| {
        b.iter(|| {
            black_box(sampler.elevations_batch(black_box(&coords), SampleMode::Bilinear, 0.0));
        });
    });
}

criterion_group!(
    benches,
    bench_single_nearest,
    bench_single_bilinear,
    bench_batch_multi_tile,
);
criterion_main!(benches);
