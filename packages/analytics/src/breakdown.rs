//! Temporal, victim, and location breakdowns of a collision set.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use collision_map_analytics_models::{
    AgeBin, Breakdown, HourCount, Hotspot, MonthCount, ValueCount, YearCount,
};
use collision_map_collision_models::CollisionEvent;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::AnalyticsError;

/// Default age histogram bin width, in years.
pub const DEFAULT_AGE_BIN_WIDTH: u16 = 10;

/// Collisions per hour of day, always 24 bins.
///
/// Events without a time of day are counted in [`Breakdown::excluded`]
/// rather than placed at midnight.
pub fn hourly_counts<'a>(
    events: impl IntoIterator<Item = &'a CollisionEvent>,
) -> Breakdown<HourCount> {
    let mut counts = [0u64; 24];
    let mut excluded = 0;

    for event in events {
        match event.hour() {
            Some(hour) => counts[hour as usize] += 1,
            None => excluded += 1,
        }
    }

    Breakdown {
        bins: (0..24)
            .zip(counts)
            .map(|(hour, count)| HourCount { hour, count })
            .collect(),
        excluded,
    }
}

/// Collisions per calendar month (all years combined), always 12 bins.
pub fn monthly_counts<'a>(
    events: impl IntoIterator<Item = &'a CollisionEvent>,
) -> Breakdown<MonthCount> {
    let mut counts = [0u64; 12];
    let mut excluded = 0;

    for event in events {
        match event.month() {
            Some(month) => counts[month as usize - 1] += 1,
            None => excluded += 1,
        }
    }

    Breakdown {
        bins: (1..=12)
            .zip(counts)
            .map(|(month, count)| MonthCount { month, count })
            .collect(),
        excluded,
    }
}

/// Collisions per year, ascending. Only years with collisions appear.
pub fn yearly_counts<'a>(
    events: impl IntoIterator<Item = &'a CollisionEvent>,
) -> Breakdown<YearCount> {
    let mut counts: BTreeMap<i32, u64> = BTreeMap::new();
    let mut excluded = 0;

    for event in events {
        match event.year() {
            Some(year) => *counts.entry(year).or_default() += 1,
            None => excluded += 1,
        }
    }

    Breakdown {
        bins: counts
            .into_iter()
            .map(|(year, count)| YearCount { year, count })
            .collect(),
        excluded,
    }
}

/// Histogram of victim ages with bins `[0, width)`, `[width, 2*width)`, ...
/// up to the bin holding the oldest victim. Intermediate empty bins are
/// included.
///
/// # Errors
///
/// * If `width` is zero
pub fn victim_age_bins<'a>(
    events: impl IntoIterator<Item = &'a CollisionEvent>,
    width: u16,
) -> Result<Breakdown<AgeBin>, AnalyticsError> {
    if width == 0 {
        return Err(AnalyticsError::InvalidBinWidth { width });
    }

    let mut counts: Vec<u64> = Vec::new();
    let mut excluded = 0;

    for event in events {
        let Some(age) = event.victim_age else {
            excluded += 1;
            continue;
        };
        let bin = usize::from(u16::from(age) / width);
        if counts.len() <= bin {
            counts.resize(bin + 1, 0);
        }
        counts[bin] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| {
            let start = u16::try_from(index)
                .unwrap_or(u16::MAX)
                .saturating_mul(width);
            AgeBin {
                start,
                end: start.saturating_add(width),
                count,
            }
        })
        .collect();

    Ok(Breakdown { bins, excluded })
}

/// Collisions per victim sex code, most frequent first.
pub fn victim_sex_counts<'a>(
    events: impl IntoIterator<Item = &'a CollisionEvent>,
) -> Breakdown<ValueCount> {
    let mut excluded = 0;
    let values = events.into_iter().filter_map(|e| {
        let value = e.victim_sex.as_deref();
        if value.is_none() {
            excluded += 1;
        }
        value
    });
    let bins = ranked_values(values, usize::MAX);

    Breakdown { bins, excluded }
}

/// Categorical attribute of a collision that can be tallied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum EventField {
    /// Premise description.
    Premise,
    /// Crime code description.
    Crime,
    /// Police reporting area.
    Area,
    /// Street address.
    Address,
}

impl EventField {
    fn value(self, event: &CollisionEvent) -> Option<&str> {
        match self {
            Self::Premise => event.premise_description.as_deref(),
            Self::Crime => event.crime_description.as_deref(),
            Self::Area => event.area_name.as_deref(),
            Self::Address => event.address.as_deref(),
        }
    }
}

/// The `n` most frequent values of `field`, most frequent first. Ties are
/// ordered by value. Events missing the field are ignored.
pub fn top_values<'a>(
    events: impl IntoIterator<Item = &'a CollisionEvent>,
    field: EventField,
    n: usize,
) -> Vec<ValueCount> {
    ranked_values(events.into_iter().filter_map(|e| field.value(e)), n)
}

fn ranked_values<'a>(values: impl Iterator<Item = &'a str>, n: usize) -> Vec<ValueCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for value in values {
        let value = value.trim();
        if !value.is_empty() {
            *counts.entry(value).or_default() += 1;
        }
    }

    let mut ranked: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct RoundedKey(i64, i64);

impl RoundedKey {
    #[allow(clippy::cast_possible_truncation)]
    fn new(latitude: f64, longitude: f64, scale: f64) -> Self {
        Self(
            (latitude * scale).round() as i64,
            (longitude * scale).round() as i64,
        )
    }
}

fn scale_for(decimals: u8) -> f64 {
    10f64.powi(i32::from(decimals))
}

/// Groups collisions by location rounded to `decimals` places and
/// returns the `top_n` locations with the most collisions.
///
/// Each hotspot reports the first known address and area seen at the
/// location and the latest known collision time. Ties are ordered by
/// coordinates.
pub fn location_hotspots<'a>(
    events: impl IntoIterator<Item = &'a CollisionEvent>,
    decimals: u8,
    top_n: usize,
) -> Vec<Hotspot> {
    struct Accumulator<'a> {
        count: u64,
        address: Option<&'a str>,
        area_name: Option<&'a str>,
        last_occurred_at: Option<NaiveDateTime>,
    }

    let scale = scale_for(decimals);
    let mut groups: BTreeMap<RoundedKey, Accumulator<'a>> = BTreeMap::new();

    for event in events {
        let entry = groups
            .entry(RoundedKey::new(event.latitude, event.longitude, scale))
            .or_insert(Accumulator {
                count: 0,
                address: None,
                area_name: None,
                last_occurred_at: None,
            });
        entry.count += 1;
        entry.address = entry.address.or(event.address.as_deref());
        entry.area_name = entry.area_name.or(event.area_name.as_deref());
        entry.last_occurred_at = entry.last_occurred_at.max(event.occurred_at);
    }

    let mut hotspots: Vec<(RoundedKey, Accumulator<'a>)> = groups.into_iter().collect();
    hotspots.sort_by(|(ka, a), (kb, b)| b.count.cmp(&a.count).then_with(|| ka.cmp(kb)));
    hotspots.truncate(top_n);

    #[allow(clippy::cast_precision_loss)]
    let hotspots = hotspots
        .into_iter()
        .map(|(key, acc)| Hotspot {
            latitude: key.0 as f64 / scale,
            longitude: key.1 as f64 / scale,
            count: acc.count,
            address: acc.address.map(str::to_string),
            area_name: acc.area_name.map(str::to_string),
            last_occurred_at: acc.last_occurred_at,
        })
        .collect();

    hotspots
}

/// Collisions whose location rounds to the same key as `(latitude,
/// longitude)` at `decimals` places, most recent first.
pub fn events_at_location<'a>(
    events: impl IntoIterator<Item = &'a CollisionEvent>,
    latitude: f64,
    longitude: f64,
    decimals: u8,
) -> Vec<&'a CollisionEvent> {
    let scale = scale_for(decimals);
    let target = RoundedKey::new(latitude, longitude, scale);

    let mut matches: Vec<&'a CollisionEvent> = events
        .into_iter()
        .filter(|e| RoundedKey::new(e.latitude, e.longitude, scale) == target)
        .collect();
    matches.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    matches
}
