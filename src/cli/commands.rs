use std::fs::File;
use std::io::{self, BufWriter, Write};

use tracing::info;

use crate::cli::args::{Cli, Commands, LocationArgs};
use crate::error::{ProcessingError, Result};
use crate::interpolation::{Geocoder, Interpolator, NominatimGeocoder};
use crate::pipeline::IngestionPipeline;
use crate::settings::Settings;
use crate::store::Store;
use crate::utils::Coordinate;

pub fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let store = Store::open(
        &settings.database.path,
        settings.database.schema_file.as_deref(),
    )?;

    match cli.command {
        Commands::InitDb => {
            println!("Database ready at {}", settings.database.path.display());
            println!(
                "Stations: {}, parameters: {}, measurements: {}",
                store.count_stations()?,
                store.count_parameters()?,
                store.count_measurements()?
            );
        }

        Commands::Ingest { limit, quiet } => {
            let mut pipeline = IngestionPipeline::new(settings, store)?.silent(quiet);
            let summary = pipeline.run(limit)?;

            println!("Stations added:     {}", summary.stations_inserted);
            println!("Archives processed: {}", summary.archives_processed);
            println!("Archives skipped:   {}", summary.archives_skipped);
            println!("Rows inserted:      {}", summary.rows_inserted);
            println!("Rows skipped:       {}", summary.rows_skipped);
            println!("Parameters added:   {}", summary.parameters_inserted);
        }

        Commands::ImportStations { file } => {
            let pipeline = IngestionPipeline::new(settings, store)?;
            let inserted = pipeline.import_stations(&file)?;
            println!("Imported {} new stations from {}", inserted, file.display());
        }

        Commands::LoadArchive { archives } => {
            let mut pipeline = IngestionPipeline::new(settings, store)?;
            let summary = pipeline.process_archives(&archives)?;

            println!("Archives processed: {}", summary.archives_processed);
            println!("Archives skipped:   {}", summary.archives_skipped);
            println!("Rows inserted:      {}", summary.rows_inserted);
            println!("Rows skipped:       {}", summary.rows_skipped);
            println!("Parameters added:   {}", summary.parameters_inserted);
        }

        Commands::Nearest { location, count } => {
            let target = resolve_location(&settings, &location)?;
            let interpolator = Interpolator::new(&store, settings.interpolation.neighbours);

            for (rank, nearby) in interpolator.nearest(&target, count)?.iter().enumerate() {
                println!(
                    "{:>2}. {:>5} {:<40} {:>8.2} km",
                    rank + 1,
                    nearby.station.station_id,
                    nearby.station.name,
                    nearby.distance_km
                );
            }
        }

        Commands::Interpolate { location, date } => {
            let target = resolve_location(&settings, &location)?;
            let interpolator = Interpolator::new(&store, settings.interpolation.neighbours);

            let estimate = interpolator
                .interpolate(&target, date)?
                .ok_or(ProcessingError::NoContributingStation(date))?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &estimate)?;
            writeln!(out)?;
        }

        Commands::Export {
            location,
            start,
            end,
            output,
        } => {
            let target = resolve_location(&settings, &location)?;
            let interpolator = Interpolator::new(&store, settings.interpolation.neighbours);
            let table = interpolator.series(&target, start, end)?;

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    table.write_csv(BufWriter::new(File::create(&path)?))?;
                    info!(path = %path.display(), rows = table.len(), "Wrote series");
                }
                None => table.write_csv(io::stdout().lock())?,
            }
        }
    }

    Ok(())
}

/// Coordinates are taken as given; an address goes through the geocoder.
fn resolve_location(settings: &Settings, location: &LocationArgs) -> Result<Coordinate> {
    match (location.lat, location.lon, &location.address) {
        (_, _, Some(address)) => NominatimGeocoder::new(&settings.geocoder)?.geocode(address),
        (Some(lat), Some(lon), None) => Coordinate::new(lat, lon),
        _ => Err(ProcessingError::InvalidInput(
            "Give either --lat and --lon or --address".to_string(),
        )),
    }
}
