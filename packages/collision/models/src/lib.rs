#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Entity types shared across the collision map engine.
//!
//! Defines the typed records produced by the record store (collision
//! events, schools, and neighborhood polygons), the proximity pairing
//! produced by the spatial crate, and the ordinal [`SafetyRating`] used
//! to classify schools by annualized collision rate.

use chrono::{Datelike as _, NaiveDateTime, NaiveTime, Timelike as _};
use geo::{Centroid as _, MultiPolygon};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A single traffic collision with valid WGS84 coordinates.
///
/// Rows without parseable coordinates never become a `CollisionEvent`;
/// they are dropped (and counted) by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionEvent {
    /// Unique report identifier (LAPD "DR Number").
    pub id: String,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
    /// Local date and time of the collision, if the date parsed.
    pub occurred_at: Option<NaiveDateTime>,
    /// Local time of day, parsed independently of the date.
    pub time_of_day: Option<NaiveTime>,
    /// Police reporting area (e.g. "Central").
    pub area_name: Option<String>,
    /// Street address or cross street.
    pub address: Option<String>,
    /// Age of the victim in years.
    pub victim_age: Option<u8>,
    /// Victim sex code (`M`, `F`, `X`, ...).
    pub victim_sex: Option<String>,
    /// Premise description (e.g. "STREET").
    pub premise_description: Option<String>,
    /// Crime code description (e.g. "TRAFFIC COLLISION").
    pub crime_description: Option<String>,
}

impl CollisionEvent {
    /// Calendar year of the collision, `None` when the date is unknown.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.occurred_at.map(|dt| dt.year())
    }

    /// Calendar month (1-12) of the collision.
    #[must_use]
    pub fn month(&self) -> Option<u32> {
        self.occurred_at.map(|dt| dt.month())
    }

    /// Hour of day (0-23) of the collision.
    #[must_use]
    pub fn hour(&self) -> Option<u32> {
        self.time_of_day.map(|t| t.hour())
    }
}

/// Two-level school classification (`Category2` / `Category3` in the LA
/// schools dataset).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolCategory {
    /// Broad category (e.g. "Public Elementary Schools").
    pub primary: Option<String>,
    /// Narrower category within `primary`.
    pub secondary: Option<String>,
}

/// A fixed-location entity (school) against which nearby collisions are
/// measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterest {
    /// Position of the row in the raw input.
    pub id: usize,
    /// School name. Treated as unique within a comparison set.
    pub name: String,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
    /// Hierarchical category.
    pub category: SchoolCategory,
    /// Student enrollment, when published.
    pub enrollment: Option<u32>,
}

/// A neighborhood boundary in WGS84 degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Zero-based position of the polygon in its input sequence.
    pub id: usize,
    /// Neighborhood council name.
    pub name: String,
    /// Boundary rings, `x` = longitude and `y` = latitude.
    pub boundary: MultiPolygon<f64>,
}

impl Polygon {
    /// Returns the `(latitude, longitude)` of the boundary centroid, or
    /// `None` for an empty boundary.
    #[must_use]
    pub fn centroid(&self) -> Option<(f64, f64)> {
        self.boundary.centroid().map(|p| (p.y(), p.x()))
    }
}

/// Pairing of a collision with a nearby point of interest.
///
/// Produced per query and never cached: the radius and the point set
/// may differ between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityAssociation {
    /// [`CollisionEvent::id`] of the collision.
    pub event_id: String,
    /// [`PointOfInterest::id`] of the school.
    pub poi_id: usize,
    /// Planar distance in degrees between the two points.
    pub distance: f64,
}

/// Safety rating of a school, derived from its annualized collision rate.
///
/// The bands partition `[0, inf)`: exactly zero is `Excellent`, then each
/// band is inclusive of its upper bound.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum SafetyRating {
    /// No collisions in the period.
    Excellent,
    /// At most 3 collisions per year.
    Good,
    /// At most 10 collisions per year.
    Fair,
    /// More than 10 collisions per year.
    Poor,
}

impl SafetyRating {
    /// Upper bound (inclusive) of the `Good` band, in collisions per year.
    pub const GOOD_MAX_RATE: f64 = 3.0;
    /// Upper bound (inclusive) of the `Fair` band, in collisions per year.
    pub const FAIR_MAX_RATE: f64 = 10.0;

    /// Classifies an annualized collision rate.
    ///
    /// Negative or NaN rates are not produced by the aggregator; they are
    /// treated as `Excellent` and `Poor` respectively so that every input
    /// maps to exactly one band.
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate <= 0.0 {
            Self::Excellent
        } else if rate <= Self::GOOD_MAX_RATE {
            Self::Good
        } else if rate <= Self::FAIR_MAX_RATE {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Dashboard label with the check-mark annotation.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent (✓✓✓)",
            Self::Good => "Good (✓✓)",
            Self::Fair => "Fair (✓)",
            Self::Poor => "Poor (⚠)",
        }
    }

    /// Returns all variants, safest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Excellent, Self::Good, Self::Fair, Self::Poor]
    }
}
