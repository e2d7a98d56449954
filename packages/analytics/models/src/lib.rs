#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate result types for the collision map engine.
//!
//! These are the tables a presentation layer renders: per-neighborhood
//! counts, per-school safety rows, and the temporal, victim, and location
//! breakdowns. All of them serialize as camelCase JSON.

use chrono::NaiveDateTime;
use collision_map_collision_models::{SafetyRating, SchoolCategory};
use serde::{Deserialize, Serialize};

/// Count, annualized rate, and safety rating for one point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Collisions within the search radius over the period.
    pub count: u64,
    /// Collisions per year.
    pub rate: f64,
    /// Rating band of `rate`.
    pub rating: SafetyRating,
}

/// Collision count for one neighborhood polygon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonCount {
    /// Polygon id.
    pub polygon_id: usize,
    /// Neighborhood name.
    pub name: String,
    /// Collisions whose location lies inside the polygon.
    pub count: u64,
}

/// One row of the school safety table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSafety {
    /// School id.
    pub poi_id: usize,
    /// School name.
    pub name: String,
    /// School category.
    pub category: SchoolCategory,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Count, rate, and rating over the selected period.
    #[serde(flatten)]
    pub aggregate: AggregateResult,
}

/// School safety rows for a year range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSafetyTable {
    /// One row per school that passed the filter, in input order.
    pub schools: Vec<SchoolSafety>,
    /// Length of the year range used as the rate denominator.
    pub period_years: u32,
    /// Nearby collisions left out because their date is unknown.
    pub excluded_undated: u64,
}

/// A set of histogram bins plus the number of events that could not be
/// placed in any bin (e.g. because their date or time was unknown).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown<T> {
    /// Bins in display order.
    pub bins: Vec<T>,
    /// Events excluded for missing data.
    pub excluded: u64,
}

/// Collisions in one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourCount {
    /// Hour (0-23).
    pub hour: u32,
    /// Number of collisions.
    pub count: u64,
}

/// Collisions in one calendar month (all years combined).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCount {
    /// Month (1-12).
    pub month: u32,
    /// Number of collisions.
    pub count: u64,
}

/// Collisions in one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearCount {
    /// Year.
    pub year: i32,
    /// Number of collisions.
    pub count: u64,
}

/// Victims in a half-open age range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeBin {
    /// Inclusive lower bound in years.
    pub start: u16,
    /// Exclusive upper bound in years.
    pub end: u16,
    /// Number of collisions.
    pub count: u64,
}

/// Occurrences of one categorical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueCount {
    /// The value (e.g. a premise description).
    pub value: String,
    /// Number of collisions.
    pub count: u64,
}

/// A location with repeated collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Rounded latitude.
    pub latitude: f64,
    /// Rounded longitude.
    pub longitude: f64,
    /// Collisions at this rounded location.
    pub count: u64,
    /// First known address reported at this location.
    pub address: Option<String>,
    /// First known reporting area at this location.
    pub area_name: Option<String>,
    /// Most recent collision time at this location.
    pub last_occurred_at: Option<NaiveDateTime>,
}
