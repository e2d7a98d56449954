//! Per-polygon counts and per-school rates.

use std::collections::{BTreeMap, HashMap};

use collision_map_analytics_models::{AggregateResult, PolygonCount};
use collision_map_collision_models::{
    CollisionEvent, PointOfInterest, Polygon, ProximityAssociation, SafetyRating,
};

/// Counts events per polygon.
///
/// `association` maps event ids to their containing polygon, as produced
/// by `collision_map_spatial::assign_polygon`; it may cover more events
/// than `events` (e.g. when `events` is year-filtered). Every polygon in
/// `polygons` appears in the output, with a zero count if it contains no
/// events.
pub fn aggregate_by_polygon<'a>(
    events: impl IntoIterator<Item = &'a CollisionEvent>,
    association: &BTreeMap<String, Option<usize>>,
    polygons: &[Polygon],
) -> BTreeMap<usize, u64> {
    let mut counts: BTreeMap<usize, u64> = polygons.iter().map(|p| (p.id, 0)).collect();
    let mut unassigned = 0u64;

    for event in events {
        match association.get(&event.id).copied().flatten() {
            Some(id) => {
                if let Some(count) = counts.get_mut(&id) {
                    *count += 1;
                } else {
                    log::warn!("Collision {} assigned to unknown polygon {id}", event.id);
                }
            }
            None => unassigned += 1,
        }
    }

    log::debug!(
        "Counted collisions for {} polygons ({unassigned} outside every polygon)",
        counts.len()
    );

    counts
}

/// Joins polygon counts with polygon names, in polygon order.
#[must_use]
pub fn polygon_counts(counts: &BTreeMap<usize, u64>, polygons: &[Polygon]) -> Vec<PolygonCount> {
    polygons
        .iter()
        .map(|p| PolygonCount {
            polygon_id: p.id,
            name: p.name.clone(),
            count: counts.get(&p.id).copied().unwrap_or(0),
        })
        .collect()
}

/// Groups the events of `events` by the school they were associated with.
///
/// Every school in `pois` gets an entry, possibly empty. Associations
/// whose event is not in `events` are ignored, so a year-filtered event
/// set narrows the groups.
pub fn group_by_poi<'a>(
    associations: &[ProximityAssociation],
    events: impl IntoIterator<Item = &'a CollisionEvent>,
    pois: &[PointOfInterest],
) -> BTreeMap<usize, Vec<&'a CollisionEvent>> {
    let by_id: HashMap<&str, &'a CollisionEvent> =
        events.into_iter().map(|e| (e.id.as_str(), e)).collect();

    let mut groups: BTreeMap<usize, Vec<&'a CollisionEvent>> =
        pois.iter().map(|p| (p.id, Vec::new())).collect();

    for association in associations {
        if let (Some(group), Some(event)) = (
            groups.get_mut(&association.poi_id),
            by_id.get(association.event_id.as_str()),
        ) {
            group.push(*event);
        }
    }

    groups
}

/// Annualized rate for `count` events over `period_years`.
///
/// The period is clamped to at least one year, so a single-instant or
/// otherwise degenerate period yields `rate == count`.
#[must_use]
pub fn annual_rate(count: u64, period_years: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let count = count as f64;
    count / period_years.max(1.0)
}

/// Computes count, annualized rate, and safety rating for every school.
pub fn aggregate_by_point_of_interest<E>(
    events_per_poi: &BTreeMap<usize, Vec<E>>,
    period_years: f64,
) -> BTreeMap<usize, AggregateResult> {
    events_per_poi
        .iter()
        .map(|(poi_id, events)| {
            let count = events.len() as u64;
            let rate = annual_rate(count, period_years);
            (
                *poi_id,
                AggregateResult {
                    count,
                    rate,
                    rating: SafetyRating::from_rate(rate),
                },
            )
        })
        .collect()
}
