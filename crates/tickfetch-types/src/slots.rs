//! Hour slot iteration.

use chrono::{DateTime, TimeDelta, Utc};

const SECONDS_PER_HOUR: i64 = 3600;

/// Truncates a timestamp to the start of its UTC hour.
#[must_use]
pub fn floor_to_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    let floored = dt.timestamp().div_euclid(SECONDS_PER_HOUR) * SECONDS_PER_HOUR;
    DateTime::from_timestamp(floored, 0).unwrap_or(dt)
}

/// Returns the hour slots covering `[start, end)` relative to the wall clock.
///
/// See [`HourSlots::at`] for the clipping rules.
#[must_use]
pub fn hour_slots(start: DateTime<Utc>, end: DateTime<Utc>) -> HourSlots {
    HourSlots::at(start, end, Utc::now())
}

/// Iterator over hour-aligned slot starts.
///
/// The iterator is cheap to clone, and a clone restarts from the clone point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourSlots {
    current: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl HourSlots {
    /// Computes the slots for `[start, end)` as seen at instant `now`.
    ///
    /// The first slot is `floor_to_hour(start)`. The exclusive bound is
    /// `floor_to_hour(end)` after two adjustments, in order:
    ///
    /// - when `end` falls in the current hour it is moved back one hour, since
    ///   the feed publishes the running hour's segment late;
    /// - an `end` still later than `now` is clamped to the current hour.
    ///
    /// An empty range yields no slots.
    #[must_use]
    pub fn at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let current_hour = floor_to_hour(now);

        let mut end = end;
        if floor_to_hour(end) == current_hour {
            end -= TimeDelta::hours(1);
        }
        if end > now {
            end = current_hour;
        }

        Self {
            current: floor_to_hour(start),
            end: floor_to_hour(end),
        }
    }

    /// Returns true if no slots remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current >= self.end
    }
}

impl Iterator for HourSlots {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }

        let slot = self.current;
        self.current += TimeDelta::hours(1);
        Some(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.is_empty() {
            return (0, Some(0));
        }
        let hours = (self.end - self.current).num_hours() as usize;
        (hours, Some(hours))
    }
}

impl ExactSizeIterator for HourSlots {}
