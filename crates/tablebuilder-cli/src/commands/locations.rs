//! Locations command implementation

use crate::cli::LocationsArgs;
use crate::output::OutputWriter;
use crate::storage::Storage;
use anyhow::{Context, Result};

pub async fn execute(args: LocationsArgs, output: &OutputWriter) -> Result<()> {
    let storage = Storage::from_dataset_file(&args.dataset)?;

    let mut locations = storage.locations.find_all().await?;
    if !args.levels.is_empty() {
        locations.retain(|location| args.levels.contains(&location.geographic_level));
    }

    let options = storage
        .hierarchy_builder()
        .build_view_models(
            &locations,
            &args.hierarchy.location_hierarchies(),
            args.hierarchy.boundary_level_id(),
        )
        .await
        .context("Failed to build location options")?;

    if output.is_json() {
        return output.result(&options);
    }

    if options.is_empty() {
        output.info("No locations");
    }

    for (level, level_options) in &options {
        output.section(format!("{} ({})", level, level_options.len()));
        output.location_tree(level_options);
    }

    Ok(())
}
