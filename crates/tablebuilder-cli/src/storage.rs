use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tablebuilder_core::config::TableBuilderOptions;
use tablebuilder_geo::LocationHierarchyBuilder;
use tablebuilder_query::{ObservationMatcher, QueryOptimiser, TableBuilderPipeline};
use tablebuilder_store::memory::{
    MemoryBoundaryStore, MemoryFilterItemRepository, MemoryLocationRepository,
    MemoryObservationStore,
};
use tablebuilder_store::ports::{
    BoundaryDataRepository, BoundaryLevelRepository, FilterItemRepository, LocationRepository,
    ObservationRowStore,
};

use crate::dataset::Dataset;

pub struct Storage {
    pub rows: Arc<dyn ObservationRowStore>,
    pub locations: Arc<dyn LocationRepository>,
    pub filter_items: Arc<dyn FilterItemRepository>,
    pub boundary_levels: Arc<dyn BoundaryLevelRepository>,
    pub boundary_data: Arc<dyn BoundaryDataRepository>,
}

impl Storage {
    /// Create in-memory storage adapters seeded from a dataset file
    pub fn from_dataset_file(path: &Path) -> Result<Self> {
        let dataset = Dataset::load(path)?;
        Self::from_dataset(dataset)
    }

    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        let rows = MemoryObservationStore::new();
        for subject_id in dataset.subjects {
            rows.add_subject(subject_id);
        }
        rows.insert_observations(dataset.observations);

        let locations = MemoryLocationRepository::new();
        for location in dataset.locations {
            let code = location.code.clone();
            locations
                .insert(location)
                .with_context(|| format!("Invalid location {}", code))?;
        }

        let filter_items = MemoryFilterItemRepository::new();
        for filter in dataset.filters {
            filter_items.add_filter(filter.id, filter.items);
        }

        let boundaries = Arc::new(MemoryBoundaryStore::new());
        for level in dataset.boundary_levels {
            boundaries.add_boundary_level(level);
        }
        for record in dataset.boundaries {
            boundaries.add_boundary_data(record.boundary_level_id, record.data);
        }

        Ok(Self {
            rows: Arc::new(rows),
            locations: Arc::new(locations),
            filter_items: Arc::new(filter_items),
            boundary_levels: boundaries.clone(),
            boundary_data: boundaries,
        })
    }

    pub fn hierarchy_builder(&self) -> LocationHierarchyBuilder {
        LocationHierarchyBuilder::new(self.boundary_levels.clone(), self.boundary_data.clone())
    }

    pub fn pipeline(&self, options: TableBuilderOptions) -> TableBuilderPipeline {
        TableBuilderPipeline::new(
            QueryOptimiser::new(self.filter_items.clone(), options),
            ObservationMatcher::new(self.rows.clone(), self.locations.clone()),
            self.locations.clone(),
            self.hierarchy_builder(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablebuilder_core::models::{GeographicLevel, Location, LocationId, SubjectId};

    #[tokio::test]
    async fn test_seeds_every_store() {
        let subject_id = SubjectId::new();
        let dataset = Dataset {
            subjects: vec![subject_id],
            locations: vec![Location::new(
                LocationId::new(),
                GeographicLevel::Country,
                "E92000001",
                "England",
            )],
            ..Dataset::default()
        };

        let storage = Storage::from_dataset(dataset).unwrap();
        assert!(storage.rows.has_subject(subject_id).await.unwrap());
        assert_eq!(storage.locations.find_all().await.unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_invalid_location() {
        let mut country =
            Location::new(LocationId::new(), GeographicLevel::Country, "E92000001", "England");
        country.ancestors.insert(
            GeographicLevel::Region,
            tablebuilder_core::models::LocationAttribute::new("E12000007", "London"),
        );
        let dataset = Dataset { locations: vec![country], ..Dataset::default() };

        let err = Storage::from_dataset(dataset).err().unwrap();
        assert!(err.to_string().contains("Invalid location E92000001"));
    }
}
