//! R-tree over collision events for repeated radius queries.
//!
//! A single [`EventIndex`] is built over the full event set and shared
//! across all per-school queries, replacing a linear scan per school.
//! Query results match [`crate::find_within_radius`] exactly: the same
//! inclusive bounding box selects candidates and the same distance test
//! filters them.

use collision_map_collision_models::CollisionEvent;
use rstar::{AABB, RTree, RTreeObject};

use crate::SpatialError;
use crate::proximity::RadiusQuery;

/// An event position stored in the R-tree, `[lon, lat]`.
struct IndexedEvent {
    position: usize,
    point: [f64; 2],
}

impl RTreeObject for IndexedEvent {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

/// Spatial index over a borrowed slice of events.
pub struct EventIndex<'a> {
    events: &'a [CollisionEvent],
    tree: RTree<IndexedEvent>,
}

impl<'a> EventIndex<'a> {
    /// Bulk-loads an R-tree over `events`.
    #[must_use]
    pub fn new(events: &'a [CollisionEvent]) -> Self {
        let entries = events
            .iter()
            .enumerate()
            .map(|(position, e)| IndexedEvent {
                position,
                point: [e.longitude, e.latitude],
            })
            .collect();
        let tree = RTree::bulk_load(entries);
        log::debug!("Indexed {} collision events", tree.size());
        Self { events, tree }
    }

    /// Number of indexed events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Events within `radius_miles` of `(lat0, lon0)` with their planar
    /// distance in degrees, in input order.
    ///
    /// # Errors
    ///
    /// * [`SpatialError::InvalidRadius`] if the radius is not positive and finite
    /// * [`SpatialError::InvalidReference`] if the reference point is not finite
    pub fn within_radius(
        &self,
        lat0: f64,
        lon0: f64,
        radius_miles: f64,
    ) -> Result<Vec<(&'a CollisionEvent, f64)>, SpatialError> {
        let query = RadiusQuery::new(lat0, lon0, radius_miles)?;
        let bbox = query.bounding_box();
        let envelope = AABB::from_corners([bbox.min_lon, bbox.min_lat], [bbox.max_lon, bbox.max_lat]);

        let mut hits: Vec<(usize, f64)> = self
            .tree
            .locate_in_envelope(&envelope)
            .filter_map(|entry| {
                query
                    .distance_within(entry.point[1], entry.point[0])
                    .map(|d| (entry.position, d))
            })
            .collect();
        hits.sort_unstable_by_key(|(position, _)| *position);

        Ok(hits
            .into_iter()
            .map(|(position, d)| (&self.events[position], d))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: usize, latitude: f64, longitude: f64) -> CollisionEvent {
        CollisionEvent {
            id: id.to_string(),
            latitude,
            longitude,
            occurred_at: None,
            time_of_day: None,
            area_name: None,
            address: None,
            victim_age: None,
            victim_sex: None,
            premise_description: None,
            crime_description: None,
        }
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = EventIndex::new(&[]);
        assert!(index.is_empty());
        assert!(index.within_radius(34.0, -118.0, 1.0).unwrap().is_empty());
    }

    #[test]
    fn returns_hits_in_input_order_with_distances() {
        let events = vec![
            event(0, 34.002, -118.0),
            event(1, 35.0, -118.0),
            event(2, 34.0, -118.0),
            event(3, 34.0, -118.001),
        ];
        let index = EventIndex::new(&events);
        assert_eq!(index.len(), 4);

        let hits = index.within_radius(34.0, -118.0, 0.2).unwrap();
        let ids: Vec<&str> = hits.iter().map(|(e, _)| e.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "2", "3"]);
        assert!(hits[1].1.abs() < f64::EPSILON);
        assert!((hits[2].1 - 0.001).abs() < 1e-9);
    }

    #[test]
    fn duplicate_coordinates_are_all_returned() {
        let events = vec![event(0, 34.0, -118.0), event(1, 34.0, -118.0)];
        let index = EventIndex::new(&events);
        assert_eq!(index.within_radius(34.0, -118.0, 0.1).unwrap().len(), 2);
    }
}
