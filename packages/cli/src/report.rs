//! Output formatting for the CLI commands.

use std::collections::HashMap;
use std::io::Write;

use collision_map_analytics_models::{
    AgeBin, Breakdown, HourCount, Hotspot, MonthCount, PolygonCount, SchoolSafetyTable,
    ValueCount, YearCount,
};
use collision_map_collision_models::{CollisionEvent, PointOfInterest, ProximityAssociation};
use serde::Serialize;

/// One line of the `nearby` CSV: a collision near a school.
#[derive(Debug, Serialize)]
struct NearbyRow<'a> {
    school_name: &'a str,
    school_id: usize,
    school_lat: f64,
    school_lon: f64,
    category2: Option<&'a str>,
    category3: Option<&'a str>,
    lat: f64,
    lon: f64,
    date_occurred: Option<String>,
    year: Option<i32>,
    area_name: Option<&'a str>,
    address: Option<&'a str>,
    dr_number: &'a str,
}

/// Writes every school/collision pairing as CSV, one row per
/// association, in association order.
pub fn write_nearby_csv<W: Write>(
    writer: W,
    associations: &[ProximityAssociation],
    events: &[CollisionEvent],
    schools: &[PointOfInterest],
) -> Result<usize, csv::Error> {
    let events: HashMap<&str, &CollisionEvent> =
        events.iter().map(|e| (e.id.as_str(), e)).collect();
    let schools: HashMap<usize, &PointOfInterest> = schools.iter().map(|s| (s.id, s)).collect();

    let mut csv = csv::Writer::from_writer(writer);
    let mut written = 0;

    for association in associations {
        let (Some(event), Some(school)) = (
            events.get(association.event_id.as_str()),
            schools.get(&association.poi_id),
        ) else {
            continue;
        };

        csv.serialize(NearbyRow {
            school_name: &school.name,
            school_id: school.id,
            school_lat: school.latitude,
            school_lon: school.longitude,
            category2: school.category.primary.as_deref(),
            category3: school.category.secondary.as_deref(),
            lat: event.latitude,
            lon: event.longitude,
            date_occurred: event.occurred_at.map(|dt| dt.to_string()),
            year: event.year(),
            area_name: event.area_name.as_deref(),
            address: event.address.as_deref(),
            dr_number: &event.id,
        })?;
        written += 1;
    }

    csv.flush()?;
    Ok(written)
}

/// Everything the `stats` command reports for a set of collisions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub label: String,
    pub total: usize,
    pub hourly: Breakdown<HourCount>,
    pub monthly: Breakdown<MonthCount>,
    pub yearly: Breakdown<YearCount>,
    pub victim_ages: Breakdown<AgeBin>,
    pub victim_sex: Breakdown<ValueCount>,
    pub premises: Vec<ValueCount>,
    pub crimes: Vec<ValueCount>,
    pub areas: Vec<ValueCount>,
    pub hotspots: Vec<Hotspot>,
}

pub fn print_neighborhoods(ranked: &[PolygonCount], selected: Option<usize>) {
    println!("{:<6} {:<40} {:>8}", "ID", "NEIGHBORHOOD", "COUNT");
    println!("{}", "-".repeat(56));
    for row in ranked {
        let marker = if Some(row.polygon_id) == selected { " *" } else { "" };
        println!(
            "{:<6} {:<40} {:>8}{marker}",
            row.polygon_id, row.name, row.count
        );
    }
}

pub fn print_school_safety(table: &SchoolSafetyTable) {
    println!(
        "{:<40} {:>7} {:>9}  {}",
        "SCHOOL", "COUNT", "PER YEAR", "RATING"
    );
    println!("{}", "-".repeat(76));
    for row in &table.schools {
        println!(
            "{:<40} {:>7} {:>9.2}  {}",
            row.name,
            row.aggregate.count,
            row.aggregate.rate,
            row.aggregate.rating.label()
        );
    }
    println!();
    println!(
        "{} schools over {} year(s); {} nearby collisions without a date were excluded",
        table.schools.len(),
        table.period_years,
        table.excluded_undated
    );
}

fn print_values(title: &str, values: &[ValueCount]) {
    if values.is_empty() {
        return;
    }
    println!("{title}:");
    for value in values {
        println!("  {:<44} {:>7}", value.value, value.count);
    }
}

pub fn print_stats(report: &StatsReport) {
    println!("{} ({} collisions)", report.label, report.total);
    println!();

    println!("By hour:");
    for bin in &report.hourly.bins {
        println!("  {:02}:00 {:>7}", bin.hour, bin.count);
    }
    println!("By month:");
    for bin in &report.monthly.bins {
        println!("  {:>5} {:>7}", bin.month, bin.count);
    }
    println!("By year:");
    for bin in &report.yearly.bins {
        println!("  {:>5} {:>7}", bin.year, bin.count);
    }
    println!("Victim age:");
    for bin in &report.victim_ages.bins {
        println!("  {:>3}-{:<3} {:>7}", bin.start, bin.end - 1, bin.count);
    }
    print_values("Victim sex", &report.victim_sex.bins);
    print_values("Premises", &report.premises);
    print_values("Crime types", &report.crimes);
    print_values("Areas", &report.areas);

    if !report.hotspots.is_empty() {
        println!("Hotspots:");
        for spot in &report.hotspots {
            println!(
                "  ({:.4}, {:.4}) {:>5}  {}",
                spot.latitude,
                spot.longitude,
                spot.count,
                spot.address.as_deref().unwrap_or("")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use collision_map_collision_models::SchoolCategory;

    use super::*;

    #[test]
    fn nearby_csv_has_one_row_per_pair() {
        let events = vec![CollisionEvent {
            id: "221804455".to_string(),
            latitude: 34.0515,
            longitude: -118.2501,
            occurred_at: None,
            time_of_day: None,
            area_name: Some("Central".to_string()),
            address: Some("1ST ST".to_string()),
            victim_age: None,
            victim_sex: None,
            premise_description: None,
            crime_description: None,
        }];
        let schools = vec![PointOfInterest {
            id: 3,
            name: "Lincoln High".to_string(),
            latitude: 34.05,
            longitude: -118.25,
            category: SchoolCategory {
                primary: Some("Public".to_string()),
                secondary: None,
            },
            enrollment: None,
        }];
        let associations = vec![
            ProximityAssociation {
                event_id: "221804455".to_string(),
                poi_id: 3,
                distance: 0.0015,
            },
            ProximityAssociation {
                event_id: "unknown".to_string(),
                poi_id: 3,
                distance: 0.0,
            },
        ];

        let mut out = Vec::new();
        let written = write_nearby_csv(&mut out, &associations, &events, &schools).unwrap();
        assert_eq!(written, 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "school_name,school_id,school_lat,school_lon,category2,category3,lat,lon,\
                 date_occurred,year,area_name,address,dr_number"
            )
        );
        assert_eq!(
            lines.next(),
            Some("Lincoln High,3,34.05,-118.25,Public,,34.0515,-118.2501,,,Central,1ST ST,221804455")
        );
        assert_eq!(lines.next(), None);
    }
}
