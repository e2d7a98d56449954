//! Point-in-polygon membership for collision events.
//!
//! Builds an R-tree over neighborhood polygon envelopes and resolves each
//! point by strict interior containment. A point on a polygon edge is not
//! inside that polygon, so a point on an edge shared by two neighborhoods
//! belongs to neither. If polygons overlap, the lowest polygon id wins.

use std::collections::BTreeMap;

use collision_map_collision_models::{CollisionEvent, Polygon};
use geo::{BoundingRect as _, Contains as _, CoordsIter as _, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};

use crate::SpatialError;

/// A boundary polygon stored in the R-tree with its id.
struct BoundaryEntry<'a> {
    id: usize,
    envelope: AABB<[f64; 2]>,
    boundary: &'a MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over a borrowed polygon set.
pub struct PolygonIndex<'a> {
    tree: RTree<BoundaryEntry<'a>>,
}

impl<'a> PolygonIndex<'a> {
    /// Validates that every polygon is in WGS84 degrees and indexes the
    /// polygon envelopes.
    ///
    /// Polygons with an empty boundary cannot contain any point and are
    /// left out of the index.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NotWgs84`] if any vertex lies outside
    /// `[-180, 180] x [-90, 90]`.
    pub fn new(polygons: &'a [Polygon]) -> Result<Self, SpatialError> {
        let mut entries = Vec::with_capacity(polygons.len());

        for polygon in polygons {
            ensure_wgs84(polygon)?;

            let Some(rect) = polygon.boundary.bounding_rect() else {
                log::warn!("Polygon {} ({}) has an empty boundary", polygon.id, polygon.name);
                continue;
            };

            entries.push(BoundaryEntry {
                id: polygon.id,
                envelope: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
                boundary: &polygon.boundary,
            });
        }

        let tree = RTree::bulk_load(entries);
        log::debug!("Indexed {} neighborhood polygons", tree.size());

        Ok(Self { tree })
    }

    /// Looks up the polygon whose interior contains `(lat, lon)`.
    ///
    /// Among several containing polygons the lowest id wins.
    #[must_use]
    pub fn lookup(&self, lat: f64, lon: f64) -> Option<usize> {
        let point = geo::Point::new(lon, lat);
        let query_env = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.boundary.contains(&point))
            .map(|entry| entry.id)
            .min()
    }
}

fn ensure_wgs84(polygon: &Polygon) -> Result<(), SpatialError> {
    polygon
        .boundary
        .coords_iter()
        .find(|c| !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y))
        .map_or(Ok(()), |c| {
            Err(SpatialError::NotWgs84 {
                polygon_id: polygon.id,
                lon: c.x,
                lat: c.y,
            })
        })
}

/// Assigns every event to the polygon containing it, or to `None`.
///
/// The result has exactly one entry per event id.
///
/// # Errors
///
/// Returns [`SpatialError::NotWgs84`] if the polygons were not reprojected
/// to WGS84 degrees.
pub fn assign_polygon(
    events: &[CollisionEvent],
    polygons: &[Polygon],
) -> Result<BTreeMap<String, Option<usize>>, SpatialError> {
    let index = PolygonIndex::new(polygons)?;

    let assignment: BTreeMap<String, Option<usize>> = events
        .iter()
        .map(|e| (e.id.clone(), index.lookup(e.latitude, e.longitude)))
        .collect();

    let assigned = assignment.values().filter(|id| id.is_some()).count();
    log::debug!(
        "Assigned {assigned} of {} collisions to {} polygons",
        assignment.len(),
        polygons.len()
    );

    Ok(assignment)
}
