use std::collections::HashSet;
use std::sync::Arc;
use tablebuilder_core::error::Result;
use tablebuilder_core::models::{
    BoundaryLevelId, LocationHierarchies, LocationId, Observation, ObservationQueryContext,
};
use tablebuilder_core::time_period;
use tablebuilder_geo::LocationHierarchyBuilder;
use tablebuilder_store::ports::LocationRepository;
use tokio_util::sync::CancellationToken;

use crate::cancellation::{cancellable, ensure_not_cancelled};
use crate::matcher::ObservationMatcher;
use crate::models::{CroppedQuery, TableBuilderResult};
use crate::optimiser::QueryOptimiser;

/// Table-builder pipeline: crop, match, then shape the result
pub struct TableBuilderPipeline {
    optimiser: QueryOptimiser,
    matcher: ObservationMatcher,
    locations: Arc<dyn LocationRepository>,
    hierarchy: LocationHierarchyBuilder,
}

impl TableBuilderPipeline {
    pub fn new(
        optimiser: QueryOptimiser,
        matcher: ObservationMatcher,
        locations: Arc<dyn LocationRepository>,
        hierarchy: LocationHierarchyBuilder,
    ) -> Self {
        Self { optimiser, matcher, locations, hierarchy }
    }

    /// Run a table query end to end
    pub async fn query(
        &self,
        query: &ObservationQueryContext,
        hierarchies: &LocationHierarchies,
        boundary_level_id: Option<BoundaryLevelId>,
        cancel: &CancellationToken,
    ) -> Result<TableBuilderResult> {
        // Phase 1: Cropping
        let CroppedQuery { query, report } =
            self.optimiser.crop_query_with_report(query, cancel).await?;

        // Phase 2: Matching
        let observations = self.matcher.find_observations(&query, cancel).await?;
        let time_periods = time_period::distinct_ordered(observations.iter().map(Observation::time_period));

        // Phase 3: Location options for the locations present
        let location_ids = present_locations(&observations);
        let locations = cancellable(cancel, self.locations.find_by_ids(&location_ids)).await?;
        let location_options = cancellable(
            cancel,
            self.hierarchy.build_view_models(&locations, hierarchies, boundary_level_id),
        )
        .await?;

        ensure_not_cancelled(cancel)?;

        tracing::debug!(
            "Table for subject {}: {} observations, {} time periods, {} location levels",
            query.subject_id,
            observations.len(),
            time_periods.len(),
            location_options.len()
        );

        Ok(TableBuilderResult {
            query,
            observations,
            time_periods,
            locations: location_options,
            cropping: report,
        })
    }
}

/// Distinct location ids of the rows, in first-seen order
fn present_locations(observations: &[Observation]) -> Vec<LocationId> {
    let mut seen = HashSet::new();
    observations
        .iter()
        .map(|observation| observation.location_id)
        .filter(|id| seen.insert(*id))
        .collect()
}
