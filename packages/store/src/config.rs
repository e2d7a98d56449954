//! Dataset configuration: which raw columns feed which entity fields.
//!
//! The Los Angeles dataset is embedded at compile time. Other datasets
//! with the same shape can be described by a TOML file of the same
//! schema and parsed with [`DatasetConfig::from_toml_str`].

use serde::{Deserialize, Serialize};

use crate::StoreError;

const LA_COLLISIONS_TOML: &str = include_str!("../datasets/la_collisions.toml");

/// Column mapping and defaults for one collision dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Unique dataset identifier (e.g. `"la_collisions"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Collision table columns.
    pub collisions: CollisionColumns,
    /// School table columns.
    pub schools: SchoolColumns,
    /// Neighborhood `GeoJSON` properties.
    pub neighborhoods: NeighborhoodProperties,
    /// Proximity query defaults.
    #[serde(default)]
    pub proximity: ProximityDefaults,
}

impl DatasetConfig {
    /// Parses a dataset configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the TOML is malformed or a
    /// required column is missing.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, StoreError> {
        Ok(toml::de::from_str(toml_str)?)
    }
}

/// Collision table column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionColumns {
    /// Unique report number.
    pub id: String,
    /// Combined `"(lat, lon)"` location field.
    pub location: String,
    /// Date the collision occurred.
    pub date: String,
    /// Military time (`HHMM`) the collision occurred.
    pub time: Option<String>,
    /// Reporting area name.
    pub area_name: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Victim age in years.
    pub victim_age: Option<String>,
    /// Victim sex code.
    pub victim_sex: Option<String>,
    /// Premise description.
    pub premise_description: Option<String>,
    /// Crime code description.
    pub crime_description: Option<String>,
}

/// School table column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolColumns {
    /// School name.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: String,
    /// Longitude in degrees.
    pub longitude: String,
    /// Broad category.
    pub category_primary: Option<String>,
    /// Narrow category.
    pub category_secondary: Option<String>,
    /// Student enrollment.
    pub enrollment: Option<String>,
}

/// Neighborhood feature property names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborhoodProperties {
    /// Property holding the neighborhood name.
    pub name: String,
}

/// Defaults for proximity queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityDefaults {
    /// School search radius in miles.
    pub radius_miles: f64,
}

impl Default for ProximityDefaults {
    fn default() -> Self {
        Self { radius_miles: 0.2 }
    }
}

/// Returns the embedded Los Angeles traffic collision configuration.
///
/// # Panics
///
/// Panics if the embedded TOML fails to parse. Since it is a compile-time
/// constant, a parse failure indicates a development error and is caught
/// by the tests below.
#[must_use]
pub fn la_collisions() -> DatasetConfig {
    DatasetConfig::from_toml_str(LA_COLLISIONS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded dataset 'la_collisions': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_parses() {
        let config = la_collisions();
        assert_eq!(config.id, "la_collisions");
        assert_eq!(config.collisions.location, "Location");
        assert_eq!(config.collisions.date, "Date Occurred");
        assert_eq!(config.schools.latitude, "Latitude");
        assert!((config.proximity.radius_miles - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn optional_columns_may_be_omitted() {
        let config = DatasetConfig::from_toml_str(
            r#"
            id = "minimal"
            name = "Minimal"

            [collisions]
            id = "id"
            location = "loc"
            date = "date"

            [schools]
            name = "name"
            latitude = "lat"
            longitude = "lon"

            [neighborhoods]
            name = "name"
            "#,
        )
        .unwrap();
        assert!(config.collisions.time.is_none());
        assert!(config.schools.enrollment.is_none());
        assert!((config.proximity.radius_miles - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let result = DatasetConfig::from_toml_str(
            r#"
            id = "broken"
            name = "Broken"
            "#,
        );
        assert!(matches!(result, Err(StoreError::Config(_))));
    }
}
