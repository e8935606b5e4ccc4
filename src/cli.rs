//! Defines command-line interface options using `clap` for the RuSeFo application.

use clap::Parser;
use std::path::PathBuf;

/// A CLI tool for normalizing CDS seasonal-forecast NetCDF files
#[derive(Parser, Debug)]
#[command(
    version = "0.3.0",
    name = "RuSeFo",
    about = "App for converting raw seasonal forecasts into CDO-compatible NetCDF"
)]
pub struct Args {
    /// Directory holding the raw forecast files for the originating centre
    #[arg(short, long)]
    pub input_dir: PathBuf,

    /// Directory to write processed files to (created if missing)
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Originating centre identifier
    #[arg(long, default_value = "ECMWF")]
    pub centre: String,

    /// First year of the download window (inclusive)
    #[arg(long, default_value_t = 2021)]
    pub start_year: i32,

    /// Last year of the download window (inclusive)
    #[arg(long, default_value_t = 2023)]
    pub end_year: i32,

    /// First month of the download window (inclusive, 1-12)
    #[arg(long, default_value_t = 1, value_parser = parse_month)]
    pub start_month: u32,

    /// Last month of the download window (inclusive, 1-12)
    #[arg(long, default_value_t = 12, value_parser = parse_month)]
    pub end_month: u32,

    /// Region-of-interest label written into the output metadata
    #[arg(long, default_value = "Chaco")]
    pub region: String,

    /// Free-text description of the region of interest
    #[arg(long)]
    pub region_description: Option<String>,

    /// Keep processing remaining files after a per-file failure
    #[arg(long, default_value_t = false)]
    pub continue_on_error: bool,

    /// Print a dataset summary for every processed file
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

fn parse_month(s: &str) -> Result<u32, String> {
    let month: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid month number", s))?;
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(format!("month {} is outside 1-12", month))
    }
}
