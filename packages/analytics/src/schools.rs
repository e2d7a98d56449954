//! School safety table.

use std::collections::{BTreeSet, HashSet};

use collision_map_analytics_models::{SchoolSafety, SchoolSafetyTable};
use collision_map_collision_models::{
    CollisionEvent, PointOfInterest, ProximityAssociation, SafetyRating,
};

use crate::aggregate::{aggregate_by_point_of_interest, group_by_poi};
use crate::filter::{YearRange, filter_by_years};

/// Narrows the set of schools shown in the safety table.
///
/// All criteria are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolFilter {
    /// Exact primary category.
    pub category_primary: Option<String>,
    /// Exact secondary category.
    pub category_secondary: Option<String>,
    /// Case-insensitive substring of the school name.
    pub name_contains: Option<String>,
    /// Only schools with this rating.
    pub rating: Option<SafetyRating>,
}

impl SchoolFilter {
    /// Whether `poi` passes the category and name criteria. The rating
    /// criterion needs the aggregate and is applied by [`school_safety`].
    #[must_use]
    pub fn matches(&self, poi: &PointOfInterest) -> bool {
        if let Some(primary) = &self.category_primary
            && poi.category.primary.as_deref() != Some(primary.as_str())
        {
            return false;
        }
        if let Some(secondary) = &self.category_secondary
            && poi.category.secondary.as_deref() != Some(secondary.as_str())
        {
            return false;
        }
        if let Some(needle) = &self.name_contains {
            let needle = needle.trim().to_lowercase();
            if !needle.is_empty() && !poi.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Builds the school safety table for `range`.
///
/// Only collisions dated inside `range` count toward a school; the rate
/// denominator is the number of calendar years in the range. Nearby
/// collisions with no date are reported in
/// [`SchoolSafetyTable::excluded_undated`]. Schools with no nearby
/// collisions appear with a zero count and an `Excellent` rating.
#[must_use]
pub fn school_safety(
    pois: &[PointOfInterest],
    associations: &[ProximityAssociation],
    events: &[CollisionEvent],
    range: YearRange,
    filter: &SchoolFilter,
) -> SchoolSafetyTable {
    let schools: Vec<&PointOfInterest> = pois.iter().filter(|p| filter.matches(p)).collect();
    let school_ids: HashSet<usize> = schools.iter().map(|p| p.id).collect();

    let nearby_ids: HashSet<&str> = associations
        .iter()
        .filter(|a| school_ids.contains(&a.poi_id))
        .map(|a| a.event_id.as_str())
        .collect();
    let nearby = filter_by_years(
        events.iter().filter(|e| nearby_ids.contains(e.id.as_str())),
        range,
    );

    let kept: Vec<PointOfInterest> = schools.iter().map(|p| (*p).clone()).collect();
    let groups = group_by_poi(associations, nearby.events.iter().copied(), &kept);
    let period_years = range.span_years();
    let results = aggregate_by_point_of_interest(&groups, f64::from(period_years));

    let rows: Vec<SchoolSafety> = kept
        .into_iter()
        .filter_map(|poi| {
            let aggregate = *results.get(&poi.id)?;
            if filter.rating.is_some_and(|rating| rating != aggregate.rating) {
                return None;
            }
            Some(SchoolSafety {
                poi_id: poi.id,
                name: poi.name,
                category: poi.category,
                latitude: poi.latitude,
                longitude: poi.longitude,
                aggregate,
            })
        })
        .collect();

    log::debug!(
        "School safety table for {}-{}: {} of {} schools",
        range.start(),
        range.end(),
        rows.len(),
        pois.len()
    );

    SchoolSafetyTable {
        schools: rows,
        period_years,
        excluded_undated: nearby.undated,
    }
}

/// Distinct primary categories, sorted.
#[must_use]
pub fn primary_categories(pois: &[PointOfInterest]) -> Vec<String> {
    pois.iter()
        .filter_map(|p| p.category.primary.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct secondary categories within `primary` (or all, if `None`),
/// sorted.
#[must_use]
pub fn secondary_categories(pois: &[PointOfInterest], primary: Option<&str>) -> Vec<String> {
    pois.iter()
        .filter(|p| primary.is_none_or(|wanted| p.category.primary.as_deref() == Some(wanted)))
        .filter_map(|p| p.category.secondary.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use collision_map_collision_models::SchoolCategory;

    use super::*;

    fn school(id: usize, name: &str, primary: &str, secondary: &str) -> PointOfInterest {
        PointOfInterest {
            id,
            name: name.to_string(),
            latitude: 34.0,
            longitude: -118.0,
            category: SchoolCategory {
                primary: Some(primary.to_string()),
                secondary: Some(secondary.to_string()),
            },
            enrollment: None,
        }
    }

    fn event(id: String, year: Option<i32>) -> CollisionEvent {
        CollisionEvent {
            id,
            latitude: 34.0,
            longitude: -118.0,
            occurred_at: year.and_then(|y| NaiveDate::from_ymd_opt(y, 2, 1)?.and_hms_opt(7, 30, 0)),
            time_of_day: None,
            area_name: None,
            address: None,
            victim_age: None,
            victim_sex: None,
            premise_description: None,
            crime_description: None,
        }
    }

    fn pair(event_id: &str, poi_id: usize) -> ProximityAssociation {
        ProximityAssociation {
            event_id: event_id.to_string(),
            poi_id,
            distance: 0.0,
        }
    }

    /// School 0 gets `n0` events in 2022, school 1 gets `n1`, school 2 none.
    fn fixture(
        n0: usize,
        n1: usize,
    ) -> (
        Vec<PointOfInterest>,
        Vec<ProximityAssociation>,
        Vec<CollisionEvent>,
    ) {
        let schools = vec![
            school(0, "Lincoln High", "Public", "High"),
            school(1, "Roosevelt Elementary", "Public", "Elementary"),
            school(2, "St. Mary", "Private", "Elementary"),
        ];
        let mut events = Vec::new();
        let mut associations = Vec::new();
        for (poi, n) in [(0, n0), (1, n1)] {
            for i in 0..n {
                let id = format!("{poi}-{i}");
                associations.push(pair(&id, poi));
                events.push(event(id, Some(2022)));
            }
        }
        (schools, associations, events)
    }

    #[test]
    fn every_school_gets_a_row() {
        let (schools, associations, events) = fixture(31, 9);
        let table = school_safety(
            &schools,
            &associations,
            &events,
            YearRange::new(2021, 2023).unwrap(),
            &SchoolFilter::default(),
        );

        assert_eq!(table.period_years, 3);
        assert_eq!(table.schools.len(), 3);
        assert_eq!(table.schools[0].aggregate.count, 31);
        assert_eq!(table.schools[0].aggregate.rating, SafetyRating::Poor);
        assert_eq!(table.schools[1].aggregate.rating, SafetyRating::Good);
        assert_eq!(table.schools[2].aggregate.count, 0);
        assert_eq!(table.schools[2].aggregate.rating, SafetyRating::Excellent);
    }

    #[test]
    fn events_outside_range_do_not_count() {
        let (schools, mut associations, mut events) = fixture(2, 0);
        associations.push(pair("old", 0));
        events.push(event("old".to_string(), Some(2015)));
        associations.push(pair("undated", 0));
        events.push(event("undated".to_string(), None));

        let table = school_safety(
            &schools,
            &associations,
            &events,
            YearRange::single(2022),
            &SchoolFilter::default(),
        );
        assert_eq!(table.schools[0].aggregate.count, 2);
        assert!((table.schools[0].aggregate.rate - 2.0).abs() < f64::EPSILON);
        assert_eq!(table.excluded_undated, 1);
    }

    #[test]
    fn filters_by_category_name_and_rating() {
        let (schools, associations, events) = fixture(31, 9);
        let range = YearRange::new(2021, 2023).unwrap();

        let public = SchoolFilter {
            category_primary: Some("Public".to_string()),
            ..SchoolFilter::default()
        };
        let table = school_safety(&schools, &associations, &events, range, &public);
        assert_eq!(table.schools.len(), 2);

        let elementary = SchoolFilter {
            category_secondary: Some("Elementary".to_string()),
            name_contains: Some("roosevelt".to_string()),
            ..SchoolFilter::default()
        };
        let table = school_safety(&schools, &associations, &events, range, &elementary);
        assert_eq!(table.schools.len(), 1);
        assert_eq!(table.schools[0].name, "Roosevelt Elementary");

        let excellent = SchoolFilter {
            rating: Some(SafetyRating::Excellent),
            ..SchoolFilter::default()
        };
        let table = school_safety(&schools, &associations, &events, range, &excellent);
        assert_eq!(table.schools.len(), 1);
        assert_eq!(table.schools[0].poi_id, 2);
    }

    #[test]
    fn lists_categories() {
        let (schools, _, _) = fixture(0, 0);
        assert_eq!(primary_categories(&schools), vec!["Private", "Public"]);
        assert_eq!(
            secondary_categories(&schools, Some("Public")),
            vec!["Elementary", "High"]
        );
        assert_eq!(secondary_categories(&schools, None), vec!["Elementary", "High"]);
    }
}
