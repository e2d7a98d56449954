//! Neighborhood ranking and selection.

use std::collections::{BTreeMap, BTreeSet};

use collision_map_analytics_models::PolygonCount;
use collision_map_collision_models::{CollisionEvent, Polygon};

/// Ranks polygons by count, highest first, ties by polygon id.
///
/// Returns the `top_n` highest polygons. If `selected` names a polygon
/// outside the top `n`, it is appended so the caller can always show it.
#[must_use]
pub fn rank_polygons(
    counts: &[PolygonCount],
    top_n: usize,
    selected: Option<usize>,
) -> Vec<PolygonCount> {
    let mut ranked: Vec<&PolygonCount> = counts.iter().collect();
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.polygon_id.cmp(&b.polygon_id))
    });

    let mut top: Vec<PolygonCount> = ranked.iter().take(top_n).map(|c| (*c).clone()).collect();

    if let Some(id) = selected
        && !top.iter().any(|c| c.polygon_id == id)
        && let Some(extra) = ranked.iter().find(|c| c.polygon_id == id)
    {
        top.push((*extra).clone());
    }

    top
}

/// Ids of polygons whose name equals `name`, ignoring ASCII case and
/// surrounding whitespace.
#[must_use]
pub fn polygon_ids_named(polygons: &[Polygon], name: &str) -> BTreeSet<usize> {
    let name = name.trim();
    polygons
        .iter()
        .filter(|p| p.name.trim().eq_ignore_ascii_case(name))
        .map(|p| p.id)
        .collect()
}

/// Events assigned to any of the polygons in `ids`, in input order.
pub fn events_in_polygons<'a>(
    events: impl IntoIterator<Item = &'a CollisionEvent>,
    association: &BTreeMap<String, Option<usize>>,
    ids: &BTreeSet<usize>,
) -> Vec<&'a CollisionEvent> {
    events
        .into_iter()
        .filter(|e| {
            association
                .get(&e.id)
                .copied()
                .flatten()
                .is_some_and(|id| ids.contains(&id))
        })
        .collect()
}
