//! Periods command implementation

use crate::cli::PeriodsArgs;
use crate::output::OutputWriter;
use anyhow::{bail, Result};
use serde::Serialize;
use tablebuilder_core::time_period::{PeriodFamily, TimePeriod, TimePeriodRange};
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct PeriodRow {
    #[tabled(rename = "Family")]
    family: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Label")]
    label: String,
}

pub fn execute(args: PeriodsArgs, output: &OutputWriter) -> Result<()> {
    let rows = match (args.from, args.to) {
        (Some(from), Some(to)) => range_rows(from, to, args.family)?,
        _ => family_rows(args.family),
    };

    if output.is_json() {
        return output.result(&rows);
    }

    output.table(rows);
    Ok(())
}

/// Canonical identifiers of one family, or of every family in rank order
fn family_rows(family: Option<PeriodFamily>) -> Vec<PeriodRow> {
    let families = match family {
        Some(family) => vec![family],
        None => PeriodFamily::ALL.to_vec(),
    };

    families
        .into_iter()
        .flat_map(|family| {
            family.identifiers().into_iter().map(move |identifier| PeriodRow {
                family: family.label().to_string(),
                code: identifier.code(),
                label: identifier.label(),
            })
        })
        .collect()
}

/// Every period from `from` to `to`, walking the start's family
fn range_rows(from: TimePeriod, to: TimePeriod, family: Option<PeriodFamily>) -> Result<Vec<PeriodRow>> {
    let start_family = from.time_identifier.family();
    if let Some(family) = family.filter(|family| *family != start_family) {
        bail!("Range starts with {} but {} was requested", start_family.label(), family.label());
    }

    Ok(TimePeriodRange::new(from, to)
        .iter()
        .map(|period| PeriodRow {
            family: start_family.label().to_string(),
            code: period.to_string(),
            label: period.label(),
        })
        .collect())
}
