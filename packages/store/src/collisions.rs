//! Collision table loader.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use collision_map_collision_models::CollisionEvent;

use crate::config::CollisionColumns;
use crate::parsing::{parse_count, parse_datetime, parse_location, parse_military_time, parse_text};
use crate::{LoadReport, Loaded, RawRow};

/// Normalizes raw collision rows into [`CollisionEvent`]s.
///
/// Rows whose location field does not yield two finite numbers are
/// dropped and counted. Unparseable dates are kept with a `None`
/// timestamp.
///
/// Every kept event gets a unique id. The first row with a report number
/// keeps it as its id; later rows repeating that number get a `#<n>`
/// suffix. Rows without a report number get `row-<index>`, suffixed the
/// same way if a real report number already uses that text. Renamed rows
/// are counted in [`LoadReport::renamed`].
#[must_use]
pub fn load_collisions(rows: &[RawRow], columns: &CollisionColumns) -> Loaded<CollisionEvent> {
    let mut report = LoadReport::default();
    let mut records = Vec::with_capacity(rows.len());
    let mut undated = 0usize;
    let mut raw_ids = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let Some((latitude, longitude)) = field(row, Some(&columns.location)).and_then(parse_location)
        else {
            log::trace!("Dropping collision row {index}: unusable location");
            report.record(false);
            continue;
        };
        report.record(true);

        let time_of_day = field(row, columns.time.as_ref()).and_then(parse_military_time);
        let occurred_at = field(row, Some(&columns.date))
            .and_then(parse_datetime)
            .map(|dt| match time_of_day {
                Some(time) => NaiveDateTime::new(dt.date(), time),
                None => dt,
            });
        if occurred_at.is_none() {
            undated += 1;
        }

        raw_ids.push((index, field(row, Some(&columns.id)).and_then(parse_text)));

        records.push(CollisionEvent {
            id: String::new(),
            latitude,
            longitude,
            occurred_at,
            time_of_day,
            area_name: text(row, columns.area_name.as_ref()),
            address: text(row, columns.address.as_ref()),
            victim_age: field(row, columns.victim_age.as_ref()).and_then(parse_count),
            victim_sex: text(row, columns.victim_sex.as_ref()),
            premise_description: text(row, columns.premise_description.as_ref()),
            crime_description: text(row, columns.crime_description.as_ref()),
        });
    }

    let (ids, renamed) = unique_ids(raw_ids);
    for (record, id) in records.iter_mut().zip(ids) {
        record.id = id;
    }
    report.renamed = renamed;
    if renamed > 0 {
        log::warn!("Renamed {renamed} collisions whose report number was repeated or missing");
    }

    log::info!(
        "Loaded {} collisions from {} rows ({} dropped for invalid location, {} without a valid date)",
        report.kept,
        report.total,
        report.dropped,
        undated
    );

    Loaded { records, report }
}

/// Resolves `(row index, report number)` pairs into distinct ids, and
/// counts how many differ from the row's own report number.
fn unique_ids(raw: Vec<(usize, Option<String>)>) -> (Vec<String>, usize) {
    let reserved: HashSet<String> = raw.iter().filter_map(|(_, id)| id.clone()).collect();
    let mut used: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut ids = Vec::with_capacity(raw.len());
    let mut renamed = 0;

    for (index, id) in raw {
        let id = match id {
            Some(id) if !used.contains(&id) => id,
            Some(id) => {
                renamed += 1;
                suffixed(&id, &reserved, &used)
            }
            None => {
                let base = format!("row-{index}");
                if reserved.contains(&base) || used.contains(&base) {
                    renamed += 1;
                    suffixed(&base, &reserved, &used)
                } else {
                    base
                }
            }
        };
        used.insert(id.clone());
        ids.push(id);
    }

    (ids, renamed)
}

fn suffixed(base: &str, reserved: &HashSet<String>, used: &HashSet<String>) -> String {
    (2usize..)
        .map(|n| format!("{base}#{n}"))
        .find(|candidate| !reserved.contains(candidate) && !used.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

fn field<'a>(row: &'a RawRow, column: Option<&String>) -> Option<&'a str> {
    row.get(column?).map(String::as_str)
}

fn text(row: &RawRow, column: Option<&String>) -> Option<String> {
    field(row, column).and_then(parse_text)
}

#[cfg(test)]
mod tests {
    use crate::config::la_collisions;

    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn loads_valid_row() {
        let rows = vec![row(&[
            ("DR Number", "210104567"),
            ("Location", "(34.05, -118.25)"),
            ("Date Occurred", "03/14/2021 12:00:00 AM"),
            ("Time Occurred", "1745"),
            ("Area Name", "Central"),
            ("Address", "5TH ST"),
            ("Victim Age", "29"),
            ("Victim Sex", "F"),
            ("Premise Description", "STREET"),
            ("Crime Code Description", "TRAFFIC COLLISION"),
        ])];

        let loaded = load_collisions(&rows, &la_collisions().collisions);
        assert_eq!(loaded.report.kept, 1);
        let event = &loaded.records[0];
        assert_eq!(event.id, "210104567");
        assert!((event.latitude - 34.05).abs() < f64::EPSILON);
        assert!((event.longitude - -118.25).abs() < f64::EPSILON);
        assert_eq!(
            event.occurred_at.unwrap().to_string(),
            "2021-03-14 17:45:00"
        );
        assert_eq!(event.hour(), Some(17));
        assert_eq!(event.victim_age, Some(29));
        assert_eq!(event.area_name.as_deref(), Some("Central"));
    }

    #[test]
    fn drops_rows_with_bad_location_and_counts_them() {
        let rows = vec![
            row(&[("DR Number", "1"), ("Location", "(34.0, -118.0)")]),
            row(&[("DR Number", "2"), ("Location", "(, )")]),
            row(&[("DR Number", "3")]),
            row(&[("DR Number", "4"), ("Location", "(34.1, abc)")]),
        ];

        let loaded = load_collisions(&rows, &la_collisions().collisions);
        assert_eq!(
            loaded.report,
            LoadReport {
                total: 4,
                kept: 1,
                dropped: 3,
                renamed: 0,
            }
        );
        assert_eq!(loaded.records[0].id, "1");
    }

    #[test]
    fn keeps_rows_with_unparseable_dates() {
        let rows = vec![row(&[
            ("DR Number", "9"),
            ("Location", "(34.0, -118.0)"),
            ("Date Occurred", "sometime"),
            ("Time Occurred", "0930"),
        ])];

        let loaded = load_collisions(&rows, &la_collisions().collisions);
        assert_eq!(loaded.records.len(), 1);
        assert!(loaded.records[0].occurred_at.is_none());
        assert_eq!(loaded.records[0].hour(), Some(9));
    }

    #[test]
    fn synthesizes_missing_ids() {
        let rows = vec![
            row(&[("Location", "(34.0, -118.0)")]),
            row(&[("DR Number", " "), ("Location", "(34.0, -118.0)")]),
        ];

        let loaded = load_collisions(&rows, &la_collisions().collisions);
        assert_eq!(loaded.records[0].id, "row-0");
        assert_eq!(loaded.records[1].id, "row-1");
    }

    #[test]
    fn repeated_and_clashing_ids_are_made_unique() {
        let rows = vec![
            row(&[("DR Number", "X"), ("Location", "(34.0, -118.0)")]),
            row(&[("DR Number", "X"), ("Location", "(34.0, -118.0)")]),
            row(&[("DR Number", "row-3"), ("Location", "(34.0, -118.0)")]),
            row(&[("Location", "(34.0, -118.0)")]),
            row(&[("DR Number", "X#2"), ("Location", "(34.0, -118.0)")]),
        ];

        let loaded = load_collisions(&rows, &la_collisions().collisions);
        let ids: Vec<&str> = loaded.records.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["X", "X#3", "row-3", "row-3#2", "X#2"]);
        assert_eq!(loaded.report.renamed, 2);
        assert_eq!(loaded.report.kept, 5);
    }
}
