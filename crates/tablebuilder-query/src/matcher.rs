use std::collections::HashSet;
use std::sync::Arc;
use tablebuilder_core::error::{Result, TableBuilderError};
use tablebuilder_core::models::{
    LocationId, LocationQuery, Observation, ObservationPredicate, ObservationQueryContext,
};
use tablebuilder_core::time_period;
use tablebuilder_store::ports::{LocationRepository, ObservationRowStore};
use tokio_util::sync::CancellationToken;

use crate::cancellation::{cancellable, ensure_not_cancelled};

/// Finds the observation rows a query selects
pub struct ObservationMatcher {
    rows: Arc<dyn ObservationRowStore>,
    locations: Arc<dyn LocationRepository>,
}

impl ObservationMatcher {
    pub fn new(rows: Arc<dyn ObservationRowStore>, locations: Arc<dyn LocationRepository>) -> Self {
        Self { rows, locations }
    }

    /// Matching rows in ascending time-period order.
    ///
    /// Runs in two phases against the row store, identifiers then rows. A
    /// cancellation seen at any point, including between the phases, fails
    /// the whole call with [`TableBuilderError::Cancelled`].
    pub async fn find_observations(
        &self,
        query: &ObservationQueryContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<Observation>> {
        ensure_not_cancelled(cancel)?;

        if !cancellable(cancel, self.rows.has_subject(query.subject_id)).await? {
            return Err(TableBuilderError::SubjectNotFound { id: query.subject_id });
        }

        let location_ids = self.resolve_locations(query, cancel).await?;
        let predicate = ObservationPredicate::new(query, location_ids);

        // Phase 1: matching identifiers
        let ids = cancellable(cancel, self.rows.find_observation_ids(&predicate, cancel)).await?;
        tracing::debug!("Matched {} observations for subject {}", ids.len(), query.subject_id);

        ensure_not_cancelled(cancel)?;

        // Phase 2: full rows
        let mut observations =
            cancellable(cancel, self.rows.get_observations(&ids, cancel)).await?;

        ensure_not_cancelled(cancel)?;

        observations.sort_by(|a, b| time_period::compare(&a.time_period(), &b.time_period()));
        Ok(observations)
    }

    /// Location ids the query's selector names, `None` when unconstrained
    async fn resolve_locations(
        &self,
        query: &ObservationQueryContext,
        cancel: &CancellationToken,
    ) -> Result<Option<HashSet<LocationId>>> {
        match query.location_query() {
            None => Ok(None),
            Some(LocationQuery::Ids(ids)) => Ok(Some(ids.iter().copied().collect())),
            Some(LocationQuery::Codes(codes)) => {
                let locations = cancellable(cancel, self.locations.find_by_codes(codes)).await?;
                tracing::debug!(
                    "Resolved {} location codes to {} locations",
                    codes.values().map(Vec::len).sum::<usize>(),
                    locations.len()
                );
                Ok(Some(locations.into_iter().map(|location| location.id).collect()))
            }
        }
    }
}
