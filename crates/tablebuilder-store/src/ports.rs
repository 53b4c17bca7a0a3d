use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tablebuilder_core::error::Result;
use tablebuilder_core::models::{
    BoundaryData, BoundaryLevel, BoundaryLevelId, FilterId, FilterItemId, GeographicLevel,
    Location, LocationId, Observation, ObservationId, ObservationPredicate, SubjectId,
};
use tokio_util::sync::CancellationToken;

/// Port for the observation row store
///
/// Matching is split in two round trips, identifiers first and full rows
/// second, so that a caller can abandon the lookup between them.
#[async_trait]
pub trait ObservationRowStore: Send + Sync {
    /// Whether the subject exists
    async fn has_subject(&self, subject_id: SubjectId) -> Result<bool>;

    /// Identifiers of the rows matching a predicate, in store order
    async fn find_observation_ids(
        &self,
        predicate: &ObservationPredicate,
        cancel: &CancellationToken,
    ) -> Result<Vec<ObservationId>>;

    /// Full rows for the given identifiers, in the order requested
    async fn get_observations(
        &self,
        ids: &[ObservationId],
        cancel: &CancellationToken,
    ) -> Result<Vec<Observation>>;
}

/// Port for location reference data
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// All locations, in load order
    async fn find_all(&self) -> Result<Vec<Location>>;

    /// Locations for the given ids, in the order requested; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[LocationId]) -> Result<Vec<Location>>;

    /// Locations whose own level is a key of `codes` and whose code is listed under it
    async fn find_by_codes(
        &self,
        codes: &BTreeMap<GeographicLevel, Vec<String>>,
    ) -> Result<Vec<Location>>;
}

/// Port for filter-item cardinality
#[async_trait]
pub trait FilterItemRepository: Send + Sync {
    /// For every distinct filter that the given items belong to, the number
    /// of items currently registered under that filter
    async fn count_filter_items_by_filter(
        &self,
        filter_item_ids: &[FilterItemId],
    ) -> Result<HashMap<FilterId, usize>>;
}

/// Port for boundary level lookup
#[async_trait]
pub trait BoundaryLevelRepository: Send + Sync {
    async fn get_boundary_level(&self, id: BoundaryLevelId) -> Result<Option<BoundaryLevel>>;
}

/// Port for boundary geometry lookup
#[async_trait]
pub trait BoundaryDataRepository: Send + Sync {
    /// Boundary data for many codes of one boundary level, in one batch.
    /// Codes without geometry are absent from the result.
    async fn find_by_boundary_level_and_codes(
        &self,
        boundary_level_id: BoundaryLevelId,
        codes: &[String],
    ) -> Result<HashMap<String, BoundaryData>>;
}
