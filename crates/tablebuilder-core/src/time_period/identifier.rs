//! Time identifiers and the period families they belong to.
//!
//! Every identifier belongs to exactly one [`PeriodFamily`] and has a fixed
//! ordinal inside that family's canonical sequence. The ordinals are defined
//! per family rather than on one shared numeric scale, so that each family
//! can be enumerated and tested on its own.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TableBuilderError};

/// Whole-year period kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YearKind {
    Academic,
    Calendar,
    Financial,
    Tax,
    Reporting,
}

impl YearKind {
    pub const ALL: [YearKind; 5] = [
        YearKind::Academic,
        YearKind::Calendar,
        YearKind::Financial,
        YearKind::Tax,
        YearKind::Reporting,
    ];
}

/// Quarter of a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Quarter from its 1-based number
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn number(self) -> u8 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }
}

/// Calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Month from its 1-based number
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }
}

/// School term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    Autumn,
    AutumnSpring,
    Spring,
    Summer,
}

impl Term {
    pub const ALL: [Term; 4] = [Term::Autumn, Term::AutumnSpring, Term::Spring, Term::Summer];
}

/// Half of a financial year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YearPart {
    Part1,
    Part2,
}

impl YearPart {
    pub const ALL: [YearPart; 2] = [YearPart::Part1, YearPart::Part2];
}

/// Week number within a year, 1 to 52
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Week(u8);

impl Week {
    pub const FIRST: Week = Week(1);
    pub const LAST: Week = Week(52);

    pub fn new(number: u8) -> Option<Self> {
        (Self::FIRST.0..=Self::LAST.0).contains(&number).then_some(Week(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

/// A family of periods sharing one canonical in-year sequence.
///
/// Declaration order is the rank used to order periods of different
/// families within the same year: whole years first, then the finer
/// families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeriodFamily {
    Years,
    AcademicQuarters,
    CalendarQuarters,
    FinancialQuarters,
    TaxQuarters,
    FinancialYearParts,
    Terms,
    Months,
    Weeks,
}

impl PeriodFamily {
    pub const ALL: [PeriodFamily; 9] = [
        PeriodFamily::Years,
        PeriodFamily::AcademicQuarters,
        PeriodFamily::CalendarQuarters,
        PeriodFamily::FinancialQuarters,
        PeriodFamily::TaxQuarters,
        PeriodFamily::FinancialYearParts,
        PeriodFamily::Terms,
        PeriodFamily::Months,
        PeriodFamily::Weeks,
    ];

    /// Number of identifiers in the family's canonical sequence
    pub fn sequence_len(self) -> usize {
        match self {
            PeriodFamily::Years => YearKind::ALL.len(),
            PeriodFamily::AcademicQuarters
            | PeriodFamily::CalendarQuarters
            | PeriodFamily::FinancialQuarters
            | PeriodFamily::TaxQuarters => Quarter::ALL.len(),
            PeriodFamily::FinancialYearParts => YearPart::ALL.len(),
            PeriodFamily::Terms => Term::ALL.len(),
            PeriodFamily::Months => Month::ALL.len(),
            PeriodFamily::Weeks => usize::from(Week::LAST.0),
        }
    }

    /// Identifier at a 0-based position of the canonical sequence
    pub fn identifier_at(self, ordinal: usize) -> Option<TimeIdentifier> {
        let identifier = match self {
            PeriodFamily::Years => TimeIdentifier::Year(*YearKind::ALL.get(ordinal)?),
            PeriodFamily::AcademicQuarters => {
                TimeIdentifier::AcademicQuarter(*Quarter::ALL.get(ordinal)?)
            }
            PeriodFamily::CalendarQuarters => {
                TimeIdentifier::CalendarQuarter(*Quarter::ALL.get(ordinal)?)
            }
            PeriodFamily::FinancialQuarters => {
                TimeIdentifier::FinancialQuarter(*Quarter::ALL.get(ordinal)?)
            }
            PeriodFamily::TaxQuarters => TimeIdentifier::TaxQuarter(*Quarter::ALL.get(ordinal)?),
            PeriodFamily::FinancialYearParts => {
                TimeIdentifier::FinancialYearPart(*YearPart::ALL.get(ordinal)?)
            }
            PeriodFamily::Terms => TimeIdentifier::Term(*Term::ALL.get(ordinal)?),
            PeriodFamily::Months => TimeIdentifier::Month(*Month::ALL.get(ordinal)?),
            PeriodFamily::Weeks => {
                TimeIdentifier::Week(Week::new(u8::try_from(ordinal + 1).ok()?)?)
            }
        };
        Some(identifier)
    }

    /// The family's identifiers in canonical order
    pub fn identifiers(self) -> Vec<TimeIdentifier> {
        (0..self.sequence_len()).filter_map(|ordinal| self.identifier_at(ordinal)).collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            PeriodFamily::Years => "Years",
            PeriodFamily::AcademicQuarters => "Academic year quarters",
            PeriodFamily::CalendarQuarters => "Calendar year quarters",
            PeriodFamily::FinancialQuarters => "Financial year quarters",
            PeriodFamily::TaxQuarters => "Tax year quarters",
            PeriodFamily::FinancialYearParts => "Financial year parts",
            PeriodFamily::Terms => "Terms",
            PeriodFamily::Months => "Months",
            PeriodFamily::Weeks => "Weeks",
        }
    }
}

impl FromStr for PeriodFamily {
    type Err = TableBuilderError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String =
            s.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_lowercase();
        match normalized.as_str() {
            "years" | "year" => Ok(PeriodFamily::Years),
            "academicquarters" => Ok(PeriodFamily::AcademicQuarters),
            "calendarquarters" => Ok(PeriodFamily::CalendarQuarters),
            "financialquarters" => Ok(PeriodFamily::FinancialQuarters),
            "taxquarters" => Ok(PeriodFamily::TaxQuarters),
            "financialyearparts" | "parts" => Ok(PeriodFamily::FinancialYearParts),
            "terms" | "term" => Ok(PeriodFamily::Terms),
            "months" | "month" => Ok(PeriodFamily::Months),
            "weeks" | "week" => Ok(PeriodFamily::Weeks),
            _ => Err(TableBuilderError::InvalidTimeIdentifier { code: s.to_string() }),
        }
    }
}

/// Identifier of a period within a year.
///
/// Serialized as its short code, e.g. `AY`, `CYQ2`, `T1T2`, `M4`, `W17`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeIdentifier {
    Year(YearKind),
    AcademicQuarter(Quarter),
    CalendarQuarter(Quarter),
    FinancialQuarter(Quarter),
    TaxQuarter(Quarter),
    FinancialYearPart(YearPart),
    Term(Term),
    Month(Month),
    Week(Week),
}

impl TimeIdentifier {
    pub const ACADEMIC_YEAR: TimeIdentifier = TimeIdentifier::Year(YearKind::Academic);
    pub const CALENDAR_YEAR: TimeIdentifier = TimeIdentifier::Year(YearKind::Calendar);
    pub const FINANCIAL_YEAR: TimeIdentifier = TimeIdentifier::Year(YearKind::Financial);
    pub const TAX_YEAR: TimeIdentifier = TimeIdentifier::Year(YearKind::Tax);
    pub const REPORTING_YEAR: TimeIdentifier = TimeIdentifier::Year(YearKind::Reporting);

    pub fn family(self) -> PeriodFamily {
        match self {
            TimeIdentifier::Year(_) => PeriodFamily::Years,
            TimeIdentifier::AcademicQuarter(_) => PeriodFamily::AcademicQuarters,
            TimeIdentifier::CalendarQuarter(_) => PeriodFamily::CalendarQuarters,
            TimeIdentifier::FinancialQuarter(_) => PeriodFamily::FinancialQuarters,
            TimeIdentifier::TaxQuarter(_) => PeriodFamily::TaxQuarters,
            TimeIdentifier::FinancialYearPart(_) => PeriodFamily::FinancialYearParts,
            TimeIdentifier::Term(_) => PeriodFamily::Terms,
            TimeIdentifier::Month(_) => PeriodFamily::Months,
            TimeIdentifier::Week(_) => PeriodFamily::Weeks,
        }
    }

    /// 0-based position within the family's canonical sequence
    pub fn ordinal(self) -> usize {
        match self {
            TimeIdentifier::Year(kind) => kind as usize,
            TimeIdentifier::AcademicQuarter(quarter)
            | TimeIdentifier::CalendarQuarter(quarter)
            | TimeIdentifier::FinancialQuarter(quarter)
            | TimeIdentifier::TaxQuarter(quarter) => usize::from(quarter.number() - 1),
            TimeIdentifier::FinancialYearPart(part) => part as usize,
            TimeIdentifier::Term(term) => term as usize,
            TimeIdentifier::Month(month) => usize::from(month.number() - 1),
            TimeIdentifier::Week(week) => usize::from(week.number() - 1),
        }
    }

    /// The identifier that follows this one, and whether reaching it crosses
    /// into the next year.
    ///
    /// Each whole-year kind is its own one-element cycle: the successor of an
    /// academic year is the next academic year, never a calendar year.
    pub fn successor(self) -> (TimeIdentifier, bool) {
        if let TimeIdentifier::Year(_) = self {
            return (self, true);
        }
        let family = self.family();
        match family.identifier_at(self.ordinal() + 1) {
            Some(next) => (next, false),
            None => (family.identifier_at(0).unwrap_or(self), true),
        }
    }

    /// Short code, e.g. `AYQ1`
    pub fn code(self) -> String {
        match self {
            TimeIdentifier::Year(kind) => year_code(kind).to_string(),
            TimeIdentifier::AcademicQuarter(q) => format!("AYQ{}", q.number()),
            TimeIdentifier::CalendarQuarter(q) => format!("CYQ{}", q.number()),
            TimeIdentifier::FinancialQuarter(q) => format!("FYQ{}", q.number()),
            TimeIdentifier::TaxQuarter(q) => format!("TYQ{}", q.number()),
            TimeIdentifier::FinancialYearPart(YearPart::Part1) => "P1".to_string(),
            TimeIdentifier::FinancialYearPart(YearPart::Part2) => "P2".to_string(),
            TimeIdentifier::Term(Term::Autumn) => "T1".to_string(),
            TimeIdentifier::Term(Term::AutumnSpring) => "T1T2".to_string(),
            TimeIdentifier::Term(Term::Spring) => "T2".to_string(),
            TimeIdentifier::Term(Term::Summer) => "T3".to_string(),
            TimeIdentifier::Month(month) => format!("M{}", month.number()),
            TimeIdentifier::Week(week) => format!("W{}", week.number()),
        }
    }

    /// Human name of the identifier, e.g. `Academic year Q1`
    pub fn label(self) -> String {
        match self {
            TimeIdentifier::Year(YearKind::Academic) => "Academic year".to_string(),
            TimeIdentifier::Year(YearKind::Calendar) => "Calendar year".to_string(),
            TimeIdentifier::Year(YearKind::Financial) => "Financial year".to_string(),
            TimeIdentifier::Year(YearKind::Tax) => "Tax year".to_string(),
            TimeIdentifier::Year(YearKind::Reporting) => "Reporting year".to_string(),
            TimeIdentifier::AcademicQuarter(q) => format!("Academic year Q{}", q.number()),
            TimeIdentifier::CalendarQuarter(q) => format!("Calendar year Q{}", q.number()),
            TimeIdentifier::FinancialQuarter(q) => format!("Financial year Q{}", q.number()),
            TimeIdentifier::TaxQuarter(q) => format!("Tax year Q{}", q.number()),
            TimeIdentifier::FinancialYearPart(YearPart::Part1) => {
                "Part 1 (April to September)".to_string()
            }
            TimeIdentifier::FinancialYearPart(YearPart::Part2) => {
                "Part 2 (October to March)".to_string()
            }
            TimeIdentifier::Term(Term::Autumn) => "Autumn term".to_string(),
            TimeIdentifier::Term(Term::AutumnSpring) => "Autumn and spring term".to_string(),
            TimeIdentifier::Term(Term::Spring) => "Spring term".to_string(),
            TimeIdentifier::Term(Term::Summer) => "Summer term".to_string(),
            TimeIdentifier::Month(month) => month.name().to_string(),
            TimeIdentifier::Week(week) => format!("Week {}", week.number()),
        }
    }
}

fn year_code(kind: YearKind) -> &'static str {
    match kind {
        YearKind::Academic => "AY",
        YearKind::Calendar => "CY",
        YearKind::Financial => "FY",
        YearKind::Tax => "TY",
        YearKind::Reporting => "RY",
    }
}

impl Ord for TimeIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.family().cmp(&other.family()).then_with(|| self.ordinal().cmp(&other.ordinal()))
    }
}

impl PartialOrd for TimeIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TimeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl FromStr for TimeIdentifier {
    type Err = TableBuilderError;

    fn from_str(code: &str) -> Result<Self> {
        let identifier = match code {
            "AY" => Some(TimeIdentifier::ACADEMIC_YEAR),
            "CY" => Some(TimeIdentifier::CALENDAR_YEAR),
            "FY" => Some(TimeIdentifier::FINANCIAL_YEAR),
            "TY" => Some(TimeIdentifier::TAX_YEAR),
            "RY" => Some(TimeIdentifier::REPORTING_YEAR),
            "P1" => Some(TimeIdentifier::FinancialYearPart(YearPart::Part1)),
            "P2" => Some(TimeIdentifier::FinancialYearPart(YearPart::Part2)),
            "T1" => Some(TimeIdentifier::Term(Term::Autumn)),
            "T1T2" => Some(TimeIdentifier::Term(Term::AutumnSpring)),
            "T2" => Some(TimeIdentifier::Term(Term::Spring)),
            "T3" => Some(TimeIdentifier::Term(Term::Summer)),
            _ => parse_numbered(code),
        };
        identifier.ok_or_else(|| TableBuilderError::InvalidTimeIdentifier { code: code.to_string() })
    }
}

/// Parse the codes that carry a number: quarters, months and weeks
fn parse_numbered(code: &str) -> Option<TimeIdentifier> {
    let quarter = |rest: &str| rest.strip_prefix('Q').and_then(parse_number).and_then(Quarter::from_number);

    if let Some(rest) = code.strip_prefix("AY") {
        return quarter(rest).map(TimeIdentifier::AcademicQuarter);
    }
    if let Some(rest) = code.strip_prefix("CY") {
        return quarter(rest).map(TimeIdentifier::CalendarQuarter);
    }
    if let Some(rest) = code.strip_prefix("FY") {
        return quarter(rest).map(TimeIdentifier::FinancialQuarter);
    }
    if let Some(rest) = code.strip_prefix("TY") {
        return quarter(rest).map(TimeIdentifier::TaxQuarter);
    }
    if let Some(rest) = code.strip_prefix('M') {
        return parse_number(rest).and_then(Month::from_number).map(TimeIdentifier::Month);
    }
    if let Some(rest) = code.strip_prefix('W') {
        return parse_number(rest).and_then(Week::new).map(TimeIdentifier::Week);
    }
    None
}

/// Plain decimal without sign or leading zeros
fn parse_number(digits: &str) -> Option<u8> {
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl TryFrom<String> for TimeIdentifier {
    type Error = TableBuilderError;

    fn try_from(code: String) -> Result<Self> {
        code.parse()
    }
}

impl From<TimeIdentifier> for String {
    fn from(identifier: TimeIdentifier) -> Self {
        identifier.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_round_trips() {
        for family in PeriodFamily::ALL {
            for identifier in family.identifiers() {
                let parsed: TimeIdentifier = identifier.code().parse().unwrap();
                assert_eq!(parsed, identifier);
                assert_eq!(parsed.family(), family);
            }
        }
    }

    #[test]
    fn test_family_lengths() {
        assert_eq!(PeriodFamily::Years.identifiers().len(), 5);
        assert_eq!(PeriodFamily::AcademicQuarters.identifiers().len(), 4);
        assert_eq!(PeriodFamily::FinancialYearParts.identifiers().len(), 2);
        assert_eq!(PeriodFamily::Terms.identifiers().len(), 4);
        assert_eq!(PeriodFamily::Months.identifiers().len(), 12);
        assert_eq!(PeriodFamily::Weeks.identifiers().len(), 52);
    }

    #[test]
    fn test_term_sequence() {
        let codes: Vec<String> =
            PeriodFamily::Terms.identifiers().into_iter().map(TimeIdentifier::code).collect();
        assert_eq!(codes, vec!["T1", "T1T2", "T2", "T3"]);
    }

    #[test]
    fn test_rejects_malformed_codes() {
        for code in ["", "W0", "W53", "W01", "M13", "M+1", "AYQ5", "Q1", "XY", "ay"] {
            assert!(code.parse::<TimeIdentifier>().is_err(), "{code} should not parse");
        }
    }

    #[test]
    fn test_successor_wraps_into_next_year() {
        let december = TimeIdentifier::Month(Month::December);
        assert_eq!(december.successor(), (TimeIdentifier::Month(Month::January), true));

        let week_ten = TimeIdentifier::Week(Week::new(10).unwrap());
        assert_eq!(week_ten.successor(), (TimeIdentifier::Week(Week::new(11).unwrap()), false));

        assert_eq!(
            TimeIdentifier::ACADEMIC_YEAR.successor(),
            (TimeIdentifier::ACADEMIC_YEAR, true)
        );
    }

    #[test]
    fn test_serializes_as_code() {
        let json = serde_json::to_string(&TimeIdentifier::Term(Term::AutumnSpring)).unwrap();
        assert_eq!(json, "\"T1T2\"");

        let parsed: TimeIdentifier = serde_json::from_str("\"FYQ3\"").unwrap();
        assert_eq!(parsed, TimeIdentifier::FinancialQuarter(Quarter::Q3));

        assert!(serde_json::from_str::<TimeIdentifier>("\"W99\"").is_err());
    }

    #[test]
    fn test_parse_period_family() {
        assert_eq!("weeks".parse::<PeriodFamily>().unwrap(), PeriodFamily::Weeks);
        assert_eq!(
            "financial-year-parts".parse::<PeriodFamily>().unwrap(),
            PeriodFamily::FinancialYearParts
        );
        assert!("fortnights".parse::<PeriodFamily>().is_err());
    }
}
