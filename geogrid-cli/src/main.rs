use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::SamplerOptions;

/// DEM elevation and geoid height CLI tool
#[derive(Parser)]
#[command(name = "geogrid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing GeoTIFF tiles
    #[arg(short, long, env = "GEOGRID_TILE_DIR", global = true)]
    tile_dir: Option<PathBuf>,

    /// Tile index JSON (default: <tile dir>/dem_index.json)
    #[arg(long, env = "GEOGRID_INDEX", global = true)]
    index: Option<PathBuf>,

    /// Maximum tiles in cache (0 disables caching)
    #[arg(
        short,
        long,
        env = "GEOGRID_CACHE_SIZE",
        default_value = "100",
        global = true
    )]
    cache_size: u64,

    /// Treat samples at or below this value as missing
    #[arg(
        long,
        env = "GEOGRID_MISSING_THRESHOLD",
        allow_negative_numbers = true,
        global = true
    )]
    missing_threshold: Option<f64>,

    /// Geoid grid file (ISG text format)
    #[arg(short, long, env = "GEOGRID_GEOID_FILE", global = true)]
    geoid_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query elevation for a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Use bilinear interpolation
        #[arg(short, long)]
        interpolate: bool,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Query geoid height for a single coordinate
    Geoid {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add elevations to every row of a CSV file
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: <input>_elevation.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude
        #[arg(long, default_value = "lon")]
        lon_col: String,

        /// Use bilinear interpolation
        #[arg(short, long)]
        interpolate: bool,
    },

    /// Display information about a tile in the index
    Info {
        /// Tile id as listed in the index (e.g., FG-GML-5235-45-DEM5A.tif)
        tile_id: String,
    },

    /// List tiles in the index
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geogrid=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let options = SamplerOptions {
        tile_dir: cli.tile_dir,
        index: cli.index,
        cache_size: cli.cache_size,
        missing_threshold: cli.missing_threshold,
    };

    match cli.command {
        Commands::Query {
            lat,
            lon,
            interpolate,
            json,
        } => commands::query::run(&options, lat, lon, interpolate, json),
        Commands::Geoid { lat, lon, json } => commands::geoid::run(cli.geoid_file, lat, lon, json),
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
            interpolate,
        } => commands::batch::run(&options, input, output, lat_col, lon_col, interpolate),
        Commands::Info { tile_id } => commands::info::run(&options, &tile_id),
        Commands::List => commands::list::run(&options),
    }
}
