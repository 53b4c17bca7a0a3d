//! Time periods and their total order
//!
//! A [`TimePeriod`] is a `(year, identifier)` pair. Periods compare by year
//! first and then by the identifier's position: its family rank, then its
//! ordinal within the family. Two periods are equal only when both the year
//! and the identifier are identical.

pub mod identifier;
pub mod range;

pub use identifier::{Month, PeriodFamily, Quarter, Term, TimeIdentifier, Week, YearKind, YearPart};
pub use range::{TimePeriodRange, TimePeriodSequence};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TableBuilderError};

/// A year paired with a period identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePeriod {
    pub year: i32,
    pub time_identifier: TimeIdentifier,
}

impl TimePeriod {
    pub fn new(year: i32, time_identifier: TimeIdentifier) -> Self {
        Self { year, time_identifier }
    }

    /// The period that follows this one in its family's sequence, or `None`
    /// when the year would overflow.
    pub fn successor(self) -> Option<TimePeriod> {
        let (time_identifier, next_year) = self.time_identifier.successor();
        let year = if next_year { self.year.checked_add(1)? } else { self.year };
        Some(TimePeriod { year, time_identifier })
    }

    /// Display label, e.g. `2010/11 Q1` or `2010 Week 12`
    pub fn label(&self) -> String {
        let year = self.year;
        let academic = format!("{}/{:02}", year, (i64::from(year) + 1).rem_euclid(100));
        let financial = format!("{}-{:02}", year, (i64::from(year) + 1).rem_euclid(100));

        match self.time_identifier {
            TimeIdentifier::Year(YearKind::Academic) => academic,
            TimeIdentifier::Year(YearKind::Financial | YearKind::Tax) => financial,
            TimeIdentifier::Year(YearKind::Calendar | YearKind::Reporting) => year.to_string(),
            TimeIdentifier::AcademicQuarter(q) => format!("{} Q{}", academic, q.number()),
            TimeIdentifier::CalendarQuarter(q) => format!("{} Q{}", year, q.number()),
            TimeIdentifier::FinancialQuarter(q) | TimeIdentifier::TaxQuarter(q) => {
                format!("{} Q{}", financial, q.number())
            }
            TimeIdentifier::FinancialYearPart(_) => {
                format!("{} {}", financial, self.time_identifier.label())
            }
            TimeIdentifier::Term(_) => format!("{} {}", academic, self.time_identifier.label()),
            TimeIdentifier::Month(_) | TimeIdentifier::Week(_) => {
                format!("{} {}", year, self.time_identifier.label())
            }
        }
    }
}

/// Canonical comparison of two periods: year, then family rank, then
/// ordinal within the family.
pub fn compare(a: &TimePeriod, b: &TimePeriod) -> Ordering {
    a.year.cmp(&b.year).then_with(|| a.time_identifier.cmp(&b.time_identifier))
}

impl Ord for TimePeriod {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl PartialOrd for TimePeriod {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.year, self.time_identifier)
    }
}

impl FromStr for TimePeriod {
    type Err = TableBuilderError;

    /// Parse the `Display` form, e.g. `2010_AY` or `2021_W14`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TableBuilderError::InvalidTimeIdentifier { code: s.to_string() };
        let (year, code) = s.split_once('_').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        Ok(TimePeriod::new(year, code.parse()?))
    }
}

/// Distinct periods in ascending order
pub fn distinct_ordered<I>(periods: I) -> Vec<TimePeriod>
where
    I: IntoIterator<Item = TimePeriod>,
{
    periods.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}
