//! Year-range filtering.

use std::collections::BTreeSet;

use collision_map_collision_models::CollisionEvent;

use crate::AnalyticsError;

/// An inclusive range of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    /// Creates a range covering `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidYearRange`] if `start > end`.
    pub const fn new(start: i32, end: i32) -> Result<Self, AnalyticsError> {
        if start > end {
            return Err(AnalyticsError::InvalidYearRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single year.
    #[must_use]
    pub const fn single(year: i32) -> Self {
        Self {
            start: year,
            end: year,
        }
    }

    /// The smallest range covering every dated event, or `None` if no
    /// event has a date.
    pub fn covering<'a>(events: impl IntoIterator<Item = &'a CollisionEvent>) -> Option<Self> {
        let years = available_years(events);
        Some(Self {
            start: *years.first()?,
            end: *years.last()?,
        })
    }

    /// First year.
    #[must_use]
    pub const fn start(&self) -> i32 {
        self.start
    }

    /// Last year.
    #[must_use]
    pub const fn end(&self) -> i32 {
        self.end
    }

    /// Number of calendar years in the range (`end - start + 1`).
    #[must_use]
    pub const fn span_years(&self) -> u32 {
        self.end.abs_diff(self.start) + 1
    }

    /// Whether `year` lies in the range.
    #[must_use]
    pub const fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }
}

/// Events that passed a year filter.
#[derive(Debug, Clone)]
pub struct YearFiltered<'a> {
    /// Events dated inside the range, in input order.
    pub events: Vec<&'a CollisionEvent>,
    /// Events left out because their date is unknown.
    pub undated: u64,
}

/// Keeps events whose year lies in `range`.
///
/// Events with no valid date cannot be placed in any year; they are
/// excluded and counted in [`YearFiltered::undated`].
pub fn filter_by_years<'a>(
    events: impl IntoIterator<Item = &'a CollisionEvent>,
    range: YearRange,
) -> YearFiltered<'a> {
    let mut undated = 0;
    let events = events
        .into_iter()
        .filter(|e| match e.year() {
            Some(year) => range.contains(year),
            None => {
                undated += 1;
                false
            }
        })
        .collect();

    if undated > 0 {
        log::debug!("Year filter excluded {undated} undated collisions");
    }

    YearFiltered { events, undated }
}

/// Distinct years present in `events`, ascending.
pub fn available_years<'a>(events: impl IntoIterator<Item = &'a CollisionEvent>) -> Vec<i32> {
    events
        .into_iter()
        .filter_map(CollisionEvent::year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
