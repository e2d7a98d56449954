//! Radius queries between collisions and points of interest.
//!
//! Distances are planar Euclidean in degree space. The mile-to-degree
//! conversion uses a fixed 111 km per degree, which is only reasonable
//! inside the Los Angeles latitude band (roughly 33-34.5°N). Longitude
//! degrees are not scaled by `cos(lat)`, so the search area is a circle in
//! degrees and a slightly squashed ellipse on the ground.

use collision_map_collision_models::{CollisionEvent, PointOfInterest, ProximityAssociation};

use crate::SpatialError;
use crate::index::EventIndex;
use crate::progress::ProgressCallback;

/// Meters in a statute mile.
pub const METERS_PER_MILE: f64 = 1609.34;

/// Approximate meters per degree of latitude in the study area.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Converts a radius in miles to the equivalent angular radius in degrees.
#[must_use]
pub fn miles_to_degrees(radius_miles: f64) -> f64 {
    radius_miles * METERS_PER_MILE / METERS_PER_DEGREE
}

/// Axis-aligned search window around a reference point, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lon: f64,
    /// Eastern edge.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Square window of half-width `radius_degrees` centred on the point.
    #[must_use]
    pub fn around(lat0: f64, lon0: f64, radius_degrees: f64) -> Self {
        Self {
            min_lat: lat0 - radius_degrees,
            max_lat: lat0 + radius_degrees,
            min_lon: lon0 - radius_degrees,
            max_lon: lon0 + radius_degrees,
        }
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// A validated radius query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RadiusQuery {
    pub lat0: f64,
    pub lon0: f64,
    pub radius_degrees: f64,
}

impl RadiusQuery {
    pub(crate) fn new(lat0: f64, lon0: f64, radius_miles: f64) -> Result<Self, SpatialError> {
        validate_radius(radius_miles)?;
        if !lat0.is_finite() || !lon0.is_finite() {
            return Err(SpatialError::InvalidReference {
                lat: lat0,
                lon: lon0,
            });
        }
        Ok(Self {
            lat0,
            lon0,
            radius_degrees: miles_to_degrees(radius_miles),
        })
    }

    pub(crate) fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.lat0, self.lon0, self.radius_degrees)
    }

    /// Exact distance to `(lat, lon)` if it lies within the radius.
    pub(crate) fn distance_within(&self, lat: f64, lon: f64) -> Option<f64> {
        let distance = planar_distance(self.lat0, self.lon0, lat, lon);
        (distance <= self.radius_degrees).then_some(distance)
    }
}

fn validate_radius(radius_miles: f64) -> Result<(), SpatialError> {
    if radius_miles.is_finite() && radius_miles > 0.0 {
        Ok(())
    } else {
        Err(SpatialError::InvalidRadius {
            radius: radius_miles,
        })
    }
}

/// Euclidean distance between two points in degree space.
#[must_use]
pub fn planar_distance(lat0: f64, lon0: f64, lat: f64, lon: f64) -> f64 {
    (lat - lat0).hypot(lon - lon0)
}

/// Returns every event within `radius_miles` of `(lat0, lon0)`, in input
/// order.
///
/// Scans all events with a bounding-box pre-filter before the exact
/// distance test. Events exactly at the reference point are included.
/// For many queries over the same events, build an [`EventIndex`] once
/// instead.
///
/// # Errors
///
/// * [`SpatialError::InvalidRadius`] if the radius is not positive and finite
/// * [`SpatialError::InvalidReference`] if the reference point is not finite
pub fn find_within_radius(
    events: &[CollisionEvent],
    lat0: f64,
    lon0: f64,
    radius_miles: f64,
) -> Result<Vec<&CollisionEvent>, SpatialError> {
    let query = RadiusQuery::new(lat0, lon0, radius_miles)?;
    let bbox = query.bounding_box();

    Ok(events
        .iter()
        .filter(|e| bbox.contains(e.latitude, e.longitude))
        .filter(|e| query.distance_within(e.latitude, e.longitude).is_some())
        .collect())
}

/// Pairs every point of interest with the events within `radius_miles`
/// of it.
///
/// The events are indexed once and shared by all per-school queries.
/// Output is grouped by school in input order, then by event in input
/// order, and is identical with or without the `parallel` feature.
///
/// # Errors
///
/// * [`SpatialError::InvalidRadius`] if the radius is not positive and finite
/// * [`SpatialError::InvalidReference`] if a school's coordinates are not finite
pub fn associate(
    events: &[CollisionEvent],
    pois: &[PointOfInterest],
    radius_miles: f64,
    progress: &dyn ProgressCallback,
) -> Result<Vec<ProximityAssociation>, SpatialError> {
    validate_radius(radius_miles)?;

    let index = EventIndex::new(events);
    progress.set_total(pois.len() as u64);

    let per_poi = |poi: &PointOfInterest| -> Result<Vec<ProximityAssociation>, SpatialError> {
        let nearby = index.within_radius(poi.latitude, poi.longitude, radius_miles)?;
        progress.inc(1);
        Ok(nearby
            .into_iter()
            .map(|(event, distance)| ProximityAssociation {
                event_id: event.id.clone(),
                poi_id: poi.id,
                distance,
            })
            .collect())
    };

    #[cfg(feature = "parallel")]
    let groups = {
        use rayon::prelude::*;
        pois.par_iter()
            .map(per_poi)
            .collect::<Result<Vec<_>, SpatialError>>()?
    };

    #[cfg(not(feature = "parallel"))]
    let groups = pois
        .iter()
        .map(per_poi)
        .collect::<Result<Vec<_>, SpatialError>>()?;

    let associations: Vec<ProximityAssociation> = groups.into_iter().flatten().collect();

    log::debug!(
        "Associated {} collision/school pairs across {} schools within {radius_miles} mi",
        associations.len(),
        pois.len()
    );
    progress.finish(format!(
        "Joined {} schools ({} pairs)",
        pois.len(),
        associations.len()
    ));

    Ok(associations)
}

#[cfg(test)]
mod tests {
    use collision_map_collision_models::SchoolCategory;

    use crate::progress::NullProgress;

    use super::*;

    fn event(id: &str, latitude: f64, longitude: f64) -> CollisionEvent {
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

    fn school(id: usize, latitude: f64, longitude: f64) -> PointOfInterest {
        PointOfInterest {
            id,
            name: format!("School {id}"),
            latitude,
            longitude,
            category: SchoolCategory::default(),
            enrollment: None,
        }
    }

    #[test]
    fn converts_miles_to_degrees() {
        let degrees = miles_to_degrees(0.2);
        assert!((degrees - 0.002_899_712).abs() < 1e-9);
    }

    #[test]
    fn includes_near_and_excludes_far_events() {
        let events = vec![
            event("near", 34.0015, -118.0),
            event("far", 34.01, -118.0),
        ];
        let found = find_within_radius(&events, 34.0, -118.0, 0.2).unwrap();
        let ids: Vec<&str> = found.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["near"]);
    }

    #[test]
    fn includes_event_at_reference_point() {
        let events = vec![event("same", 34.0, -118.0)];
        let found = find_within_radius(&events, 34.0, -118.0, 0.2).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn excludes_bounding_box_corners() {
        // Inside the square pre-filter but outside the circle.
        let r = miles_to_degrees(0.2);
        let events = vec![event("corner", 34.0 + r * 0.9, -118.0 + r * 0.9)];
        let found = find_within_radius(&events, 34.0, -118.0, 0.2).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn rejects_non_positive_radius() {
        let events = vec![event("a", 34.0, -118.0)];
        assert_eq!(
            find_within_radius(&events, 34.0, -118.0, 0.0).unwrap_err(),
            SpatialError::InvalidRadius { radius: 0.0 }
        );
        assert!(find_within_radius(&events, 34.0, -118.0, -1.0).is_err());
        assert!(find_within_radius(&events, 34.0, -118.0, f64::NAN).is_err());
    }

    #[test]
    fn rejects_non_finite_reference() {
        let events = vec![event("a", 34.0, -118.0)];
        assert!(matches!(
            find_within_radius(&events, f64::NAN, -118.0, 0.2),
            Err(SpatialError::InvalidReference { .. })
        ));
    }

    #[test]
    fn associates_each_school_with_its_neighbors() {
        let events = vec![
            event("a", 34.0, -118.0),
            event("b", 34.001, -118.0),
            event("c", 34.5, -118.5),
        ];
        let schools = vec![school(0, 34.0, -118.0), school(7, 34.5, -118.5), school(9, 33.0, -117.0)];

        let pairs = associate(&events, &schools, 0.2, &NullProgress).unwrap();
        let summary: Vec<(usize, &str)> = pairs
            .iter()
            .map(|p| (p.poi_id, p.event_id.as_str()))
            .collect();
        assert_eq!(summary, vec![(0, "a"), (0, "b"), (7, "c")]);
        assert!(pairs[0].distance.abs() < f64::EPSILON);
        assert!((pairs[1].distance - 0.001).abs() < 1e-9);
    }

    #[test]
    fn associate_validates_radius_even_without_schools() {
        let events = vec![event("a", 34.0, -118.0)];
        assert!(associate(&events, &[], -0.5, &NullProgress).is_err());
    }
}
