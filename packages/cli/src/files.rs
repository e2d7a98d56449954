//! Reading the raw tables from disk.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use collision_map_collision_models::{CollisionEvent, PointOfInterest, Polygon};
use collision_map_store::config::{DatasetConfig, la_collisions};
use collision_map_store::{
    LoadReport, RawRow, load_collisions, load_points_of_interest, load_polygons,
    parse_feature_collection,
};

use crate::error::CliError;

/// Parses CSV text into raw rows keyed by trimmed header names.
///
/// Short records are padded with empty values.
pub fn parse_csv_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                (
                    header.clone(),
                    record.get(i).unwrap_or("").trim().to_owned(),
                )
            })
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn read_csv_rows(path: &Path) -> Result<Vec<RawRow>, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_csv_rows(BufReader::new(file)).map_err(|source| CliError::Csv {
        path: path.display().to_string(),
        source,
    })
}

fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn log_report(what: &str, path: &Path, report: LoadReport) {
    if report.dropped > 0 {
        log::warn!(
            "{}: dropped {} of {} {what} rows with unusable coordinates",
            path.display(),
            report.dropped,
            report.total
        );
    }
}

/// Loads the dataset configuration from `path`, or the embedded Los
/// Angeles configuration when `None`.
pub fn load_config(path: Option<&Path>) -> Result<DatasetConfig, CliError> {
    let Some(path) = path else {
        return Ok(la_collisions());
    };
    let config = DatasetConfig::from_toml_str(&read_text(path)?)?;
    log::debug!("Using dataset config '{}' from {}", config.id, path.display());
    Ok(config)
}

/// Reads and normalizes the collision table.
pub fn load_events(path: &Path, config: &DatasetConfig) -> Result<Vec<CollisionEvent>, CliError> {
    let rows = read_csv_rows(path)?;
    let loaded = load_collisions(&rows, &config.collisions);
    log_report("collision", path, loaded.report);
    Ok(loaded.records)
}

/// Reads and normalizes the school table.
pub fn load_schools(path: &Path, config: &DatasetConfig) -> Result<Vec<PointOfInterest>, CliError> {
    let rows = read_csv_rows(path)?;
    let loaded = load_points_of_interest(&rows, &config.schools);
    log_report("school", path, loaded.report);
    Ok(loaded.records)
}

/// Reads neighborhood boundaries from a `GeoJSON` file, reprojected to
/// WGS84.
pub fn load_neighborhoods(path: &Path, config: &DatasetConfig) -> Result<Vec<Polygon>, CliError> {
    let source = parse_feature_collection(&read_text(path)?, &config.neighborhoods.name)?;
    let polygons = load_polygons(source.rows, source.crs)?;
    log::info!(
        "Loaded {} neighborhoods from {}",
        polygons.len(),
        path.display()
    );
    Ok(polygons)
}
