//! Query command implementation

use crate::cli::QueryArgs;
use crate::output::OutputWriter;
use crate::storage::Storage;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use tablebuilder_core::config::LayeredConfig;
use tablebuilder_core::models::{
    FilterItemId, IndicatorId, LocationId, LocationViewModel, ObservationQueryContext, SubjectId,
};
use tablebuilder_query::{Cropping, TableBuilderResult};
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

pub async fn execute(
    args: QueryArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
    cancel: &CancellationToken,
) -> Result<()> {
    let options = config.table_builder_options()?;
    let storage = Storage::from_dataset_file(&args.dataset)?;
    let query = build_query(&args);

    let result = storage
        .pipeline(options)
        .query(
            &query,
            &args.hierarchy.location_hierarchies(),
            args.hierarchy.boundary_level_id(),
            cancel,
        )
        .await
        .context("Table query failed")?;

    for cropping in &result.cropping.croppings {
        output.warning(describe_cropping(cropping));
    }

    if output.is_json() {
        return output.result(&result);
    }

    print_table(&result, output);
    Ok(())
}

fn build_query(args: &QueryArgs) -> ObservationQueryContext {
    let mut query = ObservationQueryContext::new(SubjectId(args.subject));

    if !args.indicators.is_empty() {
        query = query.with_indicators(args.indicators.iter().copied().map(IndicatorId));
    }

    if !args.locations.is_empty() {
        query = query.with_location_ids(args.locations.iter().copied().map(LocationId));
    } else if !args.location_codes.is_empty() {
        let mut codes: BTreeMap<_, Vec<String>> = BTreeMap::new();
        for (level, code) in &args.location_codes {
            codes.entry(*level).or_default().push(code.clone());
        }
        query = query.with_location_codes(codes);
    }

    if let (Some(from), Some(to)) = (args.from, args.to) {
        query = query.with_time_period(from, to);
    }

    if !args.filter_items.is_empty() {
        query = query.with_filter_items(args.filter_items.iter().copied().map(FilterItemId));
    }

    query
}

fn describe_cropping(cropping: &Cropping) -> String {
    match cropping {
        Cropping::TimePeriod { cropped, original_count, cropped_count, .. } => format!(
            "Time periods cropped from {} to {} (now {} to {})",
            original_count,
            cropped_count,
            cropped.start.label(),
            cropped.end.label()
        ),
        Cropping::Locations { original_count, cropped_count } => {
            format!("Locations cropped from {} to {}", original_count, cropped_count)
        }
    }
}

#[derive(Tabled)]
struct ObservationRow {
    #[tabled(rename = "Time period")]
    time_period: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Filter items")]
    filter_items: usize,
    #[tabled(rename = "Values")]
    values: String,
}

fn print_table(result: &TableBuilderResult, output: &OutputWriter) {
    output.section("Table");
    output.kv("Subject", result.query.subject_id);
    output.kv("Observations", result.observations.len());
    output.kv(
        "Estimated cells",
        format!("{} (limit {})", result.cropping.cropped_cells, result.cropping.max_table_cells_allowed),
    );

    let labels: HashMap<LocationId, String> = result
        .locations
        .values()
        .flatten()
        .flat_map(LocationViewModel::leaves)
        .map(|leaf| (leaf.id, leaf.label.clone()))
        .collect();

    let rows = result.observations.iter().map(|observation| ObservationRow {
        time_period: observation.time_period().label(),
        location: labels
            .get(&observation.location_id)
            .cloned()
            .unwrap_or_else(|| observation.location_id.to_string()),
        filter_items: observation.filter_items.len(),
        values: observation
            .measures
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", "),
    });
    output.table(rows);

    output.section("Time periods");
    let periods: Vec<String> = result.time_periods.iter().map(|p| p.label()).collect();
    output.info(periods.join(", "));

    for (level, options) in &result.locations {
        output.section(format!("Locations: {}", level));
        output.location_tree(options);
    }
}
