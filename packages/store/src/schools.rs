//! School (point of interest) table loader.

use collision_map_collision_models::{PointOfInterest, SchoolCategory};

use crate::config::SchoolColumns;
use crate::parsing::{parse_coordinate, parse_count, parse_text};
use crate::{LoadReport, Loaded, RawRow};

/// Normalizes raw school rows into [`PointOfInterest`]s.
///
/// Rows missing either coordinate are dropped and counted. The `id` of
/// each school is its position in `rows`, so ids stay stable when the
/// same table is reloaded.
#[must_use]
pub fn load_points_of_interest(
    rows: &[RawRow],
    columns: &SchoolColumns,
) -> Loaded<PointOfInterest> {
    let mut report = LoadReport::default();
    let mut records = Vec::with_capacity(rows.len());

    for (id, row) in rows.iter().enumerate() {
        let latitude = row.get(&columns.latitude).and_then(|v| parse_coordinate(v));
        let longitude = row.get(&columns.longitude).and_then(|v| parse_coordinate(v));
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            log::trace!("Dropping school row {id}: missing coordinates");
            report.record(false);
            continue;
        };
        report.record(true);

        let optional = |column: Option<&String>| {
            column
                .and_then(|c| row.get(c))
                .and_then(|v| parse_text(v))
        };

        records.push(PointOfInterest {
            id,
            name: row
                .get(&columns.name)
                .and_then(|v| parse_text(v))
                .unwrap_or_default(),
            latitude,
            longitude,
            category: SchoolCategory {
                primary: optional(columns.category_primary.as_ref()),
                secondary: optional(columns.category_secondary.as_ref()),
            },
            enrollment: columns
                .enrollment
                .as_ref()
                .and_then(|c| row.get(c))
                .and_then(|v| parse_count(v)),
        });
    }

    log::info!(
        "Loaded {} schools from {} rows ({} dropped for missing coordinates)",
        report.kept,
        report.total,
        report.dropped
    );

    Loaded { records, report }
}
