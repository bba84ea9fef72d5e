use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dwd-climate")]
#[command(about = "Ingest DWD daily climate archives and interpolate station data to any location")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        help = "Config file [default: dwd-climate.toml if present]"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and apply the schema
    InitDb,

    /// Download the station list and archives and load them
    Ingest {
        #[arg(short, long, help = "Process at most this many archives")]
        limit: Option<usize>,

        #[arg(short, long, help = "Hide the progress bar")]
        quiet: bool,
    },

    /// Import a fixed-width station list that is already on disk
    ImportStations {
        #[arg(help = "Station list file")]
        file: PathBuf,
    },

    /// Load archives that are already on disk
    LoadArchive {
        #[arg(required = true, help = "ZIP archives to load")]
        archives: Vec<PathBuf>,
    },

    /// List the stations closest to a location
    Nearest {
        #[command(flatten)]
        location: LocationArgs,

        #[arg(short = 'k', long, default_value = "5")]
        count: usize,
    },

    /// Interpolate all parameters for one day and print them as JSON
    Interpolate {
        #[command(flatten)]
        location: LocationArgs,

        #[arg(short, long, help = "Date (YYYY-MM-DD)")]
        date: NaiveDate,
    },

    /// Interpolate a date range and write it as CSV
    Export {
        #[command(flatten)]
        location: LocationArgs,

        #[arg(short, long, help = "First day (YYYY-MM-DD)")]
        start: NaiveDate,

        #[arg(short, long, help = "Last day, inclusive (YYYY-MM-DD)")]
        end: NaiveDate,

        #[arg(short, long, help = "Output CSV file [default: stdout]")]
        output: Option<PathBuf>,
    },
}

/// A location given either as coordinates or as an address to geocode.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = true)]
pub struct LocationArgs {
    #[arg(long, requires = "lon", allow_hyphen_values = true, help = "Latitude in decimal degrees")]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true, help = "Longitude in decimal degrees")]
    pub lon: Option<f64>,

    #[arg(long, conflicts_with_all = ["lat", "lon"], help = "Address to geocode")]
    pub address: Option<String>,
}
