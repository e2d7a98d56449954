#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation over joined collision data.
//!
//! Turns a (filtered) set of collision events plus the associations
//! produced by `collision_map_spatial` into the summary tables in
//! [`collision_map_analytics_models`]: per-neighborhood counts, per-school
//! annualized rates with safety ratings, and the temporal, victim, and
//! hotspot breakdowns shown alongside them.
//!
//! Every function is pure. Empty groups are reported with a zero count,
//! never omitted.

pub mod aggregate;
pub mod breakdown;
pub mod filter;
pub mod ranking;
pub mod schools;

pub use aggregate::{
    aggregate_by_point_of_interest, aggregate_by_polygon, group_by_poi, polygon_counts,
};
pub use ranking::{events_in_polygons, rank_polygons};
pub use filter::{YearRange, filter_by_years};
pub use schools::{SchoolFilter, school_safety};

/// Errors that can occur while aggregating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyticsError {
    /// The start year of a range is after its end year.
    #[error("Invalid year range {start}-{end}: start is after end")]
    InvalidYearRange {
        /// First year.
        start: i32,
        /// Last year.
        end: i32,
    },

    /// Histogram bin width must be at least one.
    #[error("Invalid bin width {width}: must be at least 1")]
    InvalidBinWidth {
        /// Width supplied by the caller.
        width: u16,
    },
}
