//! In-memory storage implementations for development and testing.
//!
//! These implementations use `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tablebuilder_core::error::{Result, TableBuilderError};
use tablebuilder_core::models::{
    BoundaryData, BoundaryLevel, BoundaryLevelId, FilterId, FilterItemId, GeographicLevel,
    Location, LocationId, Observation, ObservationId, ObservationPredicate, SubjectId,
};
use tokio_util::sync::CancellationToken;

use crate::ports::{
    BoundaryDataRepository, BoundaryLevelRepository, FilterItemRepository, LocationRepository,
    ObservationRowStore,
};

/// Rows scanned between cancellation checks
const SCAN_CHUNK_SIZE: usize = 1024;

/// In-memory implementation of ObservationRowStore
#[derive(Debug, Clone, Default)]
pub struct MemoryObservationStore {
    subjects: Arc<RwLock<HashSet<SubjectId>>>,
    observations: Arc<RwLock<Vec<Observation>>>,
    positions: Arc<RwLock<HashMap<ObservationId, usize>>>,
}

impl MemoryObservationStore {
    /// Create a new in-memory observation store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subject, which may have no rows yet
    pub fn add_subject(&self, subject_id: SubjectId) {
        self.subjects.write().unwrap().insert(subject_id);
    }

    /// Append rows, registering their subjects. A row whose id is already
    /// stored replaces the earlier row in place.
    pub fn insert_observations(&self, rows: impl IntoIterator<Item = Observation>) {
        let mut subjects = self.subjects.write().unwrap();
        let mut observations = self.observations.write().unwrap();
        let mut positions = self.positions.write().unwrap();

        for row in rows {
            subjects.insert(row.subject_id);
            match positions.get(&row.id) {
                Some(&position) => observations[position] = row,
                None => {
                    positions.insert(row.id, observations.len());
                    observations.push(row);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.observations.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObservationRowStore for MemoryObservationStore {
    async fn has_subject(&self, subject_id: SubjectId) -> Result<bool> {
        Ok(self.subjects.read().unwrap().contains(&subject_id))
    }

    async fn find_observation_ids(
        &self,
        predicate: &ObservationPredicate,
        cancel: &CancellationToken,
    ) -> Result<Vec<ObservationId>> {
        let observations = self.observations.read().unwrap();
        let mut ids = Vec::new();

        for chunk in observations.chunks(SCAN_CHUNK_SIZE) {
            if cancel.is_cancelled() {
                return Err(TableBuilderError::Cancelled);
            }
            ids.extend(chunk.iter().filter(|row| predicate.matches(row)).map(|row| row.id));
        }

        Ok(ids)
    }

    async fn get_observations(
        &self,
        ids: &[ObservationId],
        cancel: &CancellationToken,
    ) -> Result<Vec<Observation>> {
        if cancel.is_cancelled() {
            return Err(TableBuilderError::Cancelled);
        }

        let observations = self.observations.read().unwrap();
        let positions = self.positions.read().unwrap();

        Ok(ids
            .iter()
            .filter_map(|id| positions.get(id))
            .map(|&position| observations[position].clone())
            .collect())
    }
}

/// In-memory implementation of LocationRepository
#[derive(Debug, Clone, Default)]
pub struct MemoryLocationRepository {
    locations: Arc<RwLock<Vec<Location>>>,
}

impl MemoryLocationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location after checking its ancestors are all coarser
    pub fn insert(&self, location: Location) -> Result<()> {
        location.validate()?;
        let mut locations = self.locations.write().unwrap();
        match locations.iter_mut().find(|existing| existing.id == location.id) {
            Some(existing) => *existing = location,
            None => locations.push(location),
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for MemoryLocationRepository {
    async fn find_all(&self) -> Result<Vec<Location>> {
        Ok(self.locations.read().unwrap().clone())
    }

    async fn find_by_ids(&self, ids: &[LocationId]) -> Result<Vec<Location>> {
        let locations = self.locations.read().unwrap();
        let by_id: HashMap<LocationId, &Location> =
            locations.iter().map(|location| (location.id, location)).collect();

        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| by_id.get(id).map(|location| (*location).clone()))
            .collect())
    }

    async fn find_by_codes(
        &self,
        codes: &BTreeMap<GeographicLevel, Vec<String>>,
    ) -> Result<Vec<Location>> {
        let locations = self.locations.read().unwrap();
        Ok(locations
            .iter()
            .filter(|location| {
                codes
                    .get(&location.geographic_level)
                    .is_some_and(|level_codes| level_codes.contains(&location.code))
            })
            .cloned()
            .collect())
    }
}

/// In-memory implementation of FilterItemRepository
#[derive(Debug, Clone, Default)]
pub struct MemoryFilterItemRepository {
    filters: Arc<RwLock<HashMap<FilterId, Vec<FilterItemId>>>>,
    item_filters: Arc<RwLock<HashMap<FilterItemId, FilterId>>>,
}

impl MemoryFilterItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register items under a filter
    pub fn add_filter(&self, filter_id: FilterId, items: impl IntoIterator<Item = FilterItemId>) {
        let mut filters = self.filters.write().unwrap();
        let mut item_filters = self.item_filters.write().unwrap();

        let registered = filters.entry(filter_id).or_default();
        for item in items {
            if item_filters.insert(item, filter_id).is_none() {
                registered.push(item);
            }
        }
    }
}

#[async_trait]
impl FilterItemRepository for MemoryFilterItemRepository {
    async fn count_filter_items_by_filter(
        &self,
        filter_item_ids: &[FilterItemId],
    ) -> Result<HashMap<FilterId, usize>> {
        let filters = self.filters.read().unwrap();
        let item_filters = self.item_filters.read().unwrap();

        Ok(filter_item_ids
            .iter()
            .filter_map(|item| item_filters.get(item))
            .map(|filter_id| {
                let count = filters.get(filter_id).map_or(0, Vec::len);
                (*filter_id, count)
            })
            .collect())
    }
}

/// In-memory implementation of BoundaryLevelRepository and BoundaryDataRepository
#[derive(Debug, Clone, Default)]
pub struct MemoryBoundaryStore {
    levels: Arc<RwLock<HashMap<BoundaryLevelId, BoundaryLevel>>>,
    data: Arc<RwLock<HashMap<BoundaryLevelId, HashMap<String, BoundaryData>>>>,
    data_lookups: Arc<AtomicUsize>,
}

impl MemoryBoundaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_boundary_level(&self, level: BoundaryLevel) {
        self.levels.write().unwrap().insert(level.id, level);
    }

    /// Store geometry for a code within a boundary level
    pub fn add_boundary_data(&self, boundary_level_id: BoundaryLevelId, data: BoundaryData) {
        if !data.is_areal() {
            tracing::warn!(
                "Boundary {} in level {} is not a polygon; leaves will carry it as-is",
                data.code,
                boundary_level_id
            );
        }
        self.data
            .write()
            .unwrap()
            .entry(boundary_level_id)
            .or_default()
            .insert(data.code.clone(), data);
    }

    /// Number of geometry lookups served so far
    pub fn data_lookup_count(&self) -> usize {
        self.data_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BoundaryLevelRepository for MemoryBoundaryStore {
    async fn get_boundary_level(&self, id: BoundaryLevelId) -> Result<Option<BoundaryLevel>> {
        Ok(self.levels.read().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl BoundaryDataRepository for MemoryBoundaryStore {
    async fn find_by_boundary_level_and_codes(
        &self,
        boundary_level_id: BoundaryLevelId,
        codes: &[String],
    ) -> Result<HashMap<String, BoundaryData>> {
        self.data_lookups.fetch_add(1, Ordering::SeqCst);

        let data = self.data.read().unwrap();
        let Some(level_data) = data.get(&boundary_level_id) else {
            return Ok(HashMap::new());
        };

        Ok(codes
            .iter()
            .filter_map(|code| level_data.get(code).map(|d| (code.clone(), d.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Geometry, JsonObject};
    use tablebuilder_core::time_period::TimeIdentifier;
    use tablebuilder_core::models::ObservationQueryContext;

    fn create_observation(subject_id: SubjectId, year: i32) -> Observation {
        Observation {
            id: ObservationId::new(),
            subject_id,
            year,
            time_identifier: TimeIdentifier::CALENDAR_YEAR,
            location_id: LocationId::new(),
            filter_items: BTreeMap::new(),
            measures: BTreeMap::new(),
        }
    }

    fn create_boundary(code: &str) -> BoundaryData {
        BoundaryData {
            code: code.to_string(),
            name: format!("Boundary {}", code),
            geometry: Geometry::new(geojson::Value::Polygon(vec![vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![1.0, 1.0],
                vec![0.0, 0.0],
            ]])),
            properties: JsonObject::new(),
        }
    }

    #[tokio::test]
    async fn test_find_ids_then_rows() {
        let store = MemoryObservationStore::new();
        let subject_id = SubjectId::new();
        let rows = vec![
            create_observation(subject_id, 2001),
            create_observation(SubjectId::new(), 2001),
            create_observation(subject_id, 2002),
        ];
        store.insert_observations(rows.clone());

        let query = ObservationQueryContext::new(subject_id);
        let predicate = ObservationPredicate::new(&query, None);
        let token = CancellationToken::new();

        let ids = store.find_observation_ids(&predicate, &token).await.unwrap();
        assert_eq!(ids, vec![rows[0].id, rows[2].id]);

        let reversed: Vec<ObservationId> = ids.iter().rev().copied().collect();
        let fetched = store.get_observations(&reversed, &token).await.unwrap();
        assert_eq!(fetched, vec![rows[2].clone(), rows[0].clone()]);
    }

    #[tokio::test]
    async fn test_subjects_are_registered() {
        let store = MemoryObservationStore::new();
        let with_rows = SubjectId::new();
        let empty = SubjectId::new();

        store.insert_observations([create_observation(with_rows, 2000)]);
        store.add_subject(empty);

        assert!(store.has_subject(with_rows).await.unwrap());
        assert!(store.has_subject(empty).await.unwrap());
        assert!(!store.has_subject(SubjectId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_scan() {
        let store = MemoryObservationStore::new();
        let subject_id = SubjectId::new();
        store.insert_observations([create_observation(subject_id, 2000)]);

        let token = CancellationToken::new();
        token.cancel();

        let predicate = ObservationPredicate::new(&ObservationQueryContext::new(subject_id), None);
        let result = store.find_observation_ids(&predicate, &token).await;
        assert!(matches!(result, Err(TableBuilderError::Cancelled)));
    }

    #[tokio::test]
    async fn test_reinserting_row_replaces_it() {
        let store = MemoryObservationStore::new();
        let mut row = create_observation(SubjectId::new(), 2000);
        store.insert_observations([row.clone()]);

        row.year = 2001;
        store.insert_observations([row.clone()]);

        assert_eq!(store.len(), 1);
        let fetched = store.get_observations(&[row.id], &CancellationToken::new()).await.unwrap();
        assert_eq!(fetched[0].year, 2001);
    }

    #[tokio::test]
    async fn test_locations_by_ids_and_codes() {
        let repo = MemoryLocationRepository::new();
        let england = Location::new(LocationId::new(), GeographicLevel::Country, "E92000001", "England");
        let city = Location::new(
            LocationId::new(),
            GeographicLevel::LocalAuthority,
            "E09000001",
            "City of London",
        )
        .with_ancestor(GeographicLevel::Country, "E92000001", "England")
        .unwrap();
        repo.insert(england.clone()).unwrap();
        repo.insert(city.clone()).unwrap();

        let by_ids = repo.find_by_ids(&[city.id, LocationId::new(), england.id, city.id]).await.unwrap();
        assert_eq!(by_ids, vec![city.clone(), england.clone()]);

        // Code selectors only match a location's own level
        let mut codes = BTreeMap::new();
        codes.insert(GeographicLevel::Country, vec!["E92000001".to_string()]);
        let by_codes = repo.find_by_codes(&codes).await.unwrap();
        assert_eq!(by_codes, vec![england]);

        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_location_rejected() {
        let repo = MemoryLocationRepository::new();
        let mut region = Location::new(LocationId::new(), GeographicLevel::Region, "E12000007", "London");
        region.ancestors.insert(
            GeographicLevel::Ward,
            tablebuilder_core::models::LocationAttribute::new("E05000001", "Aldersgate"),
        );

        assert!(repo.insert(region).is_err());
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_filter_items_by_filter() {
        let repo = MemoryFilterItemRepository::new();
        let gender = FilterId::new();
        let phase = FilterId::new();
        let gender_items: Vec<FilterItemId> = (0..2).map(|_| FilterItemId::new()).collect();
        let phase_items: Vec<FilterItemId> = (0..4).map(|_| FilterItemId::new()).collect();
        repo.add_filter(gender, gender_items.clone());
        repo.add_filter(phase, phase_items.clone());

        let counts = repo
            .count_filter_items_by_filter(&[phase_items[0], phase_items[1], FilterItemId::new()])
            .await
            .unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&phase], 4);

        let counts = repo
            .count_filter_items_by_filter(&[gender_items[0], phase_items[3]])
            .await
            .unwrap();
        assert_eq!(counts[&gender], 2);
        assert_eq!(counts[&phase], 4);
    }

    #[tokio::test]
    async fn test_boundary_lookup_is_batched() {
        let store = MemoryBoundaryStore::new();
        let level_id = BoundaryLevelId(1);
        store.add_boundary_level(BoundaryLevel {
            id: level_id,
            level: GeographicLevel::LocalAuthority,
            label: "Local authorities 2021".to_string(),
        });
        store.add_boundary_data(level_id, create_boundary("E09000001"));
        store.add_boundary_data(level_id, create_boundary("E09000002"));

        let codes = vec!["E09000001".to_string(), "E09000002".to_string(), "missing".to_string()];
        let found = store.find_by_boundary_level_and_codes(level_id, &codes).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(store.data_lookup_count(), 1);
        assert!(store.get_boundary_level(level_id).await.unwrap().is_some());
        assert!(store.get_boundary_level(BoundaryLevelId(2)).await.unwrap().is_none());
    }
}
