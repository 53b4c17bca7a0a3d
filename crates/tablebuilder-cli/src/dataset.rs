//! Dataset file format
//!
//! A dataset is one JSON document holding the reference data and rows the
//! in-memory stores are seeded with:
//!
//! ```json
//! {
//!   "subjects": ["<uuid>"],
//!   "filters": [{ "id": "<uuid>", "items": ["<uuid>"] }],
//!   "locations": [{ "id": "<uuid>", "geographicLevel": "region", "code": "E12000007", "label": "London" }],
//!   "observations": [{ "id": "<uuid>", "subjectId": "<uuid>", "year": 2020, "timeIdentifier": "AY", ... }],
//!   "boundaryLevels": [{ "id": 1, "level": "region", "label": "Regions 2021" }],
//!   "boundaries": [{ "boundaryLevelId": 1, "code": "E12000007", "name": "London", "geometry": { ... } }]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tablebuilder_core::models::{
    BoundaryData, BoundaryLevel, BoundaryLevelId, FilterId, FilterItemId, Location, Observation,
    SubjectId,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Subjects without rows; subjects of observations are registered implicitly
    #[serde(default)]
    pub subjects: Vec<SubjectId>,

    #[serde(default)]
    pub filters: Vec<FilterDefinition>,

    #[serde(default)]
    pub locations: Vec<Location>,

    #[serde(default)]
    pub observations: Vec<Observation>,

    #[serde(default)]
    pub boundary_levels: Vec<BoundaryLevel>,

    #[serde(default)]
    pub boundaries: Vec<BoundaryRecord>,
}

/// A filter and the items registered under it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDefinition {
    pub id: FilterId,
    pub items: Vec<FilterItemId>,
}

/// Boundary data tagged with the boundary level it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryRecord {
    pub boundary_level_id: BoundaryLevelId,

    #[serde(flatten)]
    pub data: BoundaryData,
}

impl Dataset {
    /// Read a dataset file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;

        let dataset: Dataset = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dataset file: {}", path.display()))?;

        tracing::debug!(
            "Loaded dataset {}: {} locations, {} observations, {} boundaries",
            path.display(),
            dataset.locations.len(),
            dataset.observations.len(),
            dataset.boundaries.len()
        );

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_dataset() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "subjects": ["0b5a3c1e-4d2f-4a8b-9c6d-7e8f9a0b1c2d"],
                "locations": [{{
                    "id": "5f1e2d3c-4b5a-4c6d-8e7f-9a0b1c2d3e4f",
                    "geographicLevel": "region",
                    "code": "E12000007",
                    "label": "London"
                }}],
                "boundaryLevels": [{{ "id": 1, "level": "region", "label": "Regions 2021" }}],
                "boundaries": [{{
                    "boundaryLevelId": 1,
                    "code": "E12000007",
                    "name": "London",
                    "geometry": {{ "type": "Point", "coordinates": [0.0, 51.5] }}
                }}]
            }}"#
        )
        .unwrap();

        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset.subjects.len(), 1);
        assert_eq!(dataset.locations[0].label, "London");
        assert_eq!(dataset.boundaries[0].boundary_level_id, BoundaryLevelId(1));
        assert_eq!(dataset.boundaries[0].data.code, "E12000007");
        assert!(dataset.observations.is_empty());
    }

    #[test]
    fn test_missing_dataset_file() {
        let err = Dataset::load(Path::new("/nonexistent/dataset.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read dataset file"));
    }
}
