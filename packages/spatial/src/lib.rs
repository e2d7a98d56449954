#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial joins between collision events, schools, and neighborhoods.
//!
//! * [`proximity`] finds collisions within a radius of a reference point
//!   using a bounding-box pre-filter followed by an exact planar distance
//!   test in degree space.
//! * [`index`] builds an R-tree over the events once so that many
//!   per-school radius queries share it.
//! * [`membership`] assigns each collision to at most one neighborhood
//!   polygon by strict interior containment.
//!
//! Every query is a pure function over borrowed, immutable inputs.
//!
//! ## Features
//!
//! - **`parallel`** - Run per-school proximity queries on a rayon pool

pub mod index;
pub mod membership;
pub mod progress;
pub mod proximity;

pub use index::EventIndex;
pub use membership::{PolygonIndex, assign_polygon};
pub use proximity::{associate, find_within_radius, miles_to_degrees};

/// Errors raised when a spatial query's preconditions are violated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpatialError {
    /// Search radius must be a positive, finite distance.
    #[error("Invalid search radius {radius} miles: must be positive and finite")]
    InvalidRadius {
        /// Radius supplied by the caller, in miles.
        radius: f64,
    },

    /// Reference point coordinates must be finite.
    #[error("Invalid reference point ({lat}, {lon})")]
    InvalidReference {
        /// Reference latitude.
        lat: f64,
        /// Reference longitude.
        lon: f64,
    },

    /// A polygon vertex lies outside the WGS84 degree range, which means
    /// the polygon was not reprojected before the membership query.
    #[error("Polygon {polygon_id} is not in WGS84: vertex ({lon}, {lat}) out of range")]
    NotWgs84 {
        /// Offending polygon id.
        polygon_id: usize,
        /// Vertex longitude (x).
        lon: f64,
        /// Vertex latitude (y).
        lat: f64,
    },
}
