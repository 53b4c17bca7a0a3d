//! Inclusive time-period ranges

use serde::{Deserialize, Serialize};

use super::{TimeIdentifier, TimePeriod};

/// Inclusive range of periods, bounded by the total period order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePeriodRange {
    pub start: TimePeriod,
    pub end: TimePeriod,
}

impl TimePeriodRange {
    pub fn new(start: TimePeriod, end: TimePeriod) -> Self {
        Self { start, end }
    }

    /// Whether a period falls between `start` and `end`, both inclusive
    pub fn contains(&self, period: &TimePeriod) -> bool {
        self.start <= *period && *period <= self.end
    }

    /// Periods of the range, walking the start's family sequence across year
    /// boundaries and stopping at the last period not after `end`.
    pub fn iter(&self) -> TimePeriodSequence {
        TimePeriodSequence {
            next: (self.start <= self.end).then_some(self.start),
            end: self.end,
        }
    }

    pub fn periods(&self) -> Vec<TimePeriod> {
        self.iter().collect()
    }

    /// Number of periods the range spans, saturating at `usize::MAX`.
    ///
    /// Computed from positions in the walked sequence, so the cost does not
    /// depend on the length of the range.
    pub fn period_count(&self) -> usize {
        let cycle = Cycle::of(self.start.time_identifier);
        let count = cycle.last_position_until(&self.end) - cycle.position(&self.start) + 1;
        usize::try_from(count.max(0)).unwrap_or(usize::MAX)
    }

    /// The range cut down to its first `max_periods` periods, or `None` when
    /// it already spans no more than that.
    pub fn truncated(&self, max_periods: usize) -> Option<TimePeriodRange> {
        let max_periods = max_periods.max(1);
        if self.period_count() <= max_periods {
            return None;
        }

        let cycle = Cycle::of(self.start.time_identifier);
        let kept = i64::try_from(max_periods).ok()?;
        let last_kept = cycle.period_at(cycle.position(&self.start) + kept - 1)?;
        Some(TimePeriodRange::new(self.start, last_kept))
    }
}

/// The identifiers a range steps through each year: one whole-year kind, or
/// every identifier of a sub-year family. A period's position is
/// `year * len + ordinal`, so positions follow the period order.
#[derive(Debug, Clone, Copy)]
struct Cycle {
    start: TimeIdentifier,
    len: usize,
}

impl Cycle {
    fn of(start: TimeIdentifier) -> Self {
        let len = match start {
            TimeIdentifier::Year(_) => 1,
            other => other.family().sequence_len(),
        };
        Self { start, len }
    }

    fn identifier_at(&self, ordinal: usize) -> Option<TimeIdentifier> {
        match self.start {
            TimeIdentifier::Year(_) => (ordinal == 0).then_some(self.start),
            other => other.family().identifier_at(ordinal),
        }
    }

    fn ordinal(&self, identifier: TimeIdentifier) -> usize {
        match identifier {
            TimeIdentifier::Year(_) => 0,
            other => other.ordinal(),
        }
    }

    fn position(&self, period: &TimePeriod) -> i64 {
        i64::from(period.year) * self.len as i64 + self.ordinal(period.time_identifier) as i64
    }

    /// Position of the last cycle member not after `end`
    fn last_position_until(&self, end: &TimePeriod) -> i64 {
        let within_year = (0..self.len)
            .filter_map(|ordinal| self.identifier_at(ordinal))
            .filter(|identifier| *identifier <= end.time_identifier)
            .count();
        i64::from(end.year) * self.len as i64 + within_year as i64 - 1
    }

    fn period_at(&self, position: i64) -> Option<TimePeriod> {
        let len = self.len as i64;
        let year = i32::try_from(position.div_euclid(len)).ok()?;
        let ordinal = usize::try_from(position.rem_euclid(len)).ok()?;
        Some(TimePeriod::new(year, self.identifier_at(ordinal)?))
    }
}

impl IntoIterator for &TimePeriodRange {
    type Item = TimePeriod;
    type IntoIter = TimePeriodSequence;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the periods of a [`TimePeriodRange`]
#[derive(Debug, Clone)]
pub struct TimePeriodSequence {
    next: Option<TimePeriod>,
    end: TimePeriod,
}

impl Iterator for TimePeriodSequence {
    type Item = TimePeriod;

    fn next(&mut self) -> Option<TimePeriod> {
        let current = self.next?;
        self.next = current.successor().filter(|next| *next <= self.end);
        Some(current)
    }
}
