use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lcz-transitions")]
#[command(about = "Count land-cover class transitions between consecutive classified rasters")]
#[command(version)]
pub struct Args {
    /// Classified GeoTIFFs in chronological order (at least two)
    #[arg(value_name = "RASTER", required = true, num_args = 2..)]
    pub rasters: Vec<PathBuf>,

    /// Study-area boundary (any OGR polygon source, e.g. shapefile or GeoJSON)
    #[arg(short, long, value_name = "FILE")]
    pub boundary: PathBuf,

    /// Directory the transition tables are written to
    #[arg(short, long, value_name = "DIR", default_value = "results")]
    pub output_dir: PathBuf,

    /// JSON configuration (reference system, class scheme, no-data policy)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Reference EPSG code every raster is reprojected to (default: 3857)
    #[arg(long, value_name = "CODE")]
    pub epsg: Option<u32>,

    /// Override the no-data value of every raster
    #[arg(long, value_name = "VALUE", allow_hyphen_values = true)]
    pub nodata: Option<i32>,

    /// Class codes left out of percentage views (repeatable, e.g. --exclude 7)
    #[arg(long, value_name = "CODE")]
    pub exclude: Vec<i32>,

    /// Also write per-pair percentage tables (implied by --exclude)
    #[arg(long)]
    pub percentages: bool,

    /// Also write the sum of all pair matrices against the first and last snapshot
    #[arg(long)]
    pub cumulative: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
