#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record store for the collision map engine.
//!
//! Normalizes raw tabular rows (already read by the caller from CSV or
//! `GeoJSON`) into the typed entities of
//! [`collision_map_collision_models`]. Rows with unusable coordinates are
//! dropped and counted in a [`LoadReport`] rather than raised as errors.
//! Neighborhood polygons supplied in Web Mercator are reprojected to
//! WGS84 on load.
//!
//! This crate performs no file I/O.

pub mod collisions;
pub mod config;
pub mod crs;
pub mod features;
pub mod parsing;
pub mod polygons;
pub mod schools;

use std::collections::BTreeMap;

pub use collisions::load_collisions;
pub use features::{PolygonSource, parse_feature_collection};
pub use polygons::{PolygonRow, load_polygons};
pub use schools::load_points_of_interest;

/// A raw input row: column (or property) name to trimmed text value.
pub type RawRow = BTreeMap<String, String>;

/// Errors that can occur while normalizing raw input.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` document could not be parsed.
    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    /// The polygon source declares a coordinate reference system that
    /// cannot be reprojected to WGS84.
    #[error("Unsupported coordinate reference system: {crs}")]
    UnsupportedCrs {
        /// CRS identifier as declared by the source.
        crs: String,
    },

    /// A polygon row does not carry polygonal geometry.
    #[error("Invalid geometry for polygon {index}: {message}")]
    InvalidGeometry {
        /// Position of the offending row.
        index: usize,
        /// What was wrong with it.
        message: String,
    },

    /// A dataset configuration could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Row accounting for a single load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows supplied by the caller.
    pub total: usize,
    /// Rows that became entities.
    pub kept: usize,
    /// Rows excluded for missing or non-numeric coordinates.
    pub dropped: usize,
    /// Kept rows whose id was changed to keep ids unique.
    pub renamed: usize,
}

impl LoadReport {
    fn record(&mut self, kept: bool) {
        self.total += 1;
        if kept {
            self.kept += 1;
        } else {
            self.dropped += 1;
        }
    }
}

/// Entities produced by a load, with the row accounting.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    /// Entities in input order.
    pub records: Vec<T>,
    /// How many rows were kept and dropped.
    pub report: LoadReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_report_counts_both_outcomes() {
        let mut report = LoadReport::default();
        report.record(true);
        report.record(false);
        report.record(true);
        assert_eq!(
            report,
            LoadReport {
                total: 3,
                kept: 2,
                dropped: 1,
                renamed: 0,
            }
        );
    }
}
