use clap::Parser;
use raster2poly::{GeoJsonWriter, PolygonizeConfig, ScanOrder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "raster2poly", about = "Raster image to polygon features (GeoJSON)")]
struct Cli {
    /// Input image path (PNG, JPEG, BMP, TIFF)
    #[arg(short, long)]
    input: PathBuf,

    /// Output GeoJSON path (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML preset; the flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cell value that is never polygonized
    #[arg(long, allow_hyphen_values = true)]
    nodata: Option<i64>,

    /// Scan line direction
    #[arg(long, value_enum)]
    scan_order: Option<ScanOrderArg>,

    /// World X of the raster's top-left corner
    #[arg(long, allow_hyphen_values = true)]
    origin_x: Option<f64>,

    /// World Y of the raster's top-left corner
    #[arg(long, allow_hyphen_values = true)]
    origin_y: Option<f64>,

    /// Cell width in world units
    #[arg(long, allow_hyphen_values = true)]
    pixel_width: Option<f64>,

    /// Cell height in world units (negative for north-up rasters)
    #[arg(long, allow_hyphen_values = true)]
    pixel_height: Option<f64>,

    /// Drop regions with fewer cells than this
    #[arg(long)]
    min_cells: Option<usize>,

    /// Finalize regions on all cores
    #[arg(long)]
    parallel: bool,

    /// Keep only ring corners where the outline turns
    #[arg(long)]
    merge_collinear: bool,

    /// Leave rings in stroke order instead of exterior CCW / holes CW
    #[arg(long)]
    no_fix_direction: bool,

    /// Read pixels as packed 0xRRGGBB instead of luminance
    #[arg(long)]
    rgb: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ScanOrderArg {
    Column,
    Row,
}

impl From<ScanOrderArg> for ScanOrder {
    fn from(arg: ScanOrderArg) -> Self {
        match arg {
            ScanOrderArg::Column => ScanOrder::ColumnMajor,
            ScanOrderArg::Row => ScanOrder::RowMajor,
        }
    }
}

impl Cli {
    fn config(&self) -> Result<PolygonizeConfig, raster2poly::PolygonizeError> {
        let mut config = match &self.config {
            Some(path) => PolygonizeConfig::from_toml_file(path)?,
            None => PolygonizeConfig::default(),
        };
        if self.nodata.is_some() {
            config.nodata = self.nodata;
        }
        if let Some(order) = self.scan_order {
            config.scan_order = order.into();
        }
        let t = &mut config.transform;
        t.origin_x = self.origin_x.unwrap_or(t.origin_x);
        t.origin_y = self.origin_y.unwrap_or(t.origin_y);
        t.pixel_width = self.pixel_width.unwrap_or(t.pixel_width);
        t.pixel_height = self.pixel_height.unwrap_or(t.pixel_height);
        if let Some(n) = self.min_cells {
            config.min_cells = n;
        }
        config.parallel |= self.parallel;
        config.merge_collinear |= self.merge_collinear;
        if self.no_fix_direction {
            config.fix_direction = false;
        }
        if self.rgb {
            config.band = raster2poly::Band::Rgb;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config()?;

    // Header
    eprintln!();
    eprintln!("  raster2poly \u{00b7} {}", cli.input.display());
    eprintln!();

    let grid = raster2poly::load_image(&cli.input, config.band)?;
    let out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    let mut writer = GeoJsonWriter::new(out);
    let summary = raster2poly::polygonize_into(&grid, &config, &mut writer)?;

    for failure in &summary.failures {
        eprintln!("  \u{2717} region {} (value {}): {}", failure.region, failure.value, failure.error);
    }

    // Footer
    eprintln!();
    let target = cli
        .output
        .as_ref()
        .map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
    eprintln!(
        "  \u{2713} {} features from {} regions \u{2192} {}",
        summary.features, summary.regions, target
    );
    eprintln!();

    Ok(())
}
