use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tablebuilder_core::error::{Result, TableBuilderError};
use tablebuilder_core::models::{
    BoundaryLevelId, GeographicLevel, Location, LocationHierarchies, LocationOptions,
};
use tablebuilder_store::ports::{BoundaryDataRepository, BoundaryLevelRepository};

use crate::hierarchy::{build_level_options, validate_chain, GeometryByCode};

/// Builds location options per geographic level, optionally decorating leaves
/// with boundary geometry
pub struct LocationHierarchyBuilder {
    boundary_levels: Arc<dyn BoundaryLevelRepository>,
    boundary_data: Arc<dyn BoundaryDataRepository>,
}

impl LocationHierarchyBuilder {
    pub fn new(
        boundary_levels: Arc<dyn BoundaryLevelRepository>,
        boundary_data: Arc<dyn BoundaryDataRepository>,
    ) -> Self {
        Self { boundary_levels, boundary_data }
    }

    /// Build the option trees for `locations`, keyed by level key.
    ///
    /// Levels without locations are omitted. A level missing from
    /// `hierarchies` renders as flat leaves. When `boundary_level_id` is
    /// given, leaves at the boundary level's geographic level carry their
    /// boundary feature, fetched in a single lookup.
    pub async fn build_view_models(
        &self,
        locations: &[Location],
        hierarchies: &LocationHierarchies,
        boundary_level_id: Option<BoundaryLevelId>,
    ) -> Result<LocationOptions> {
        for (level, chain) in hierarchies {
            validate_chain(*level, chain)?;
        }

        let mut by_level: BTreeMap<GeographicLevel, Vec<&Location>> = BTreeMap::new();
        for location in locations {
            by_level.entry(location.geographic_level).or_default().push(location);
        }

        let geometry = match boundary_level_id {
            Some(id) => Some(self.load_geometry(id, &by_level).await?),
            None => None,
        };

        let options = by_level
            .iter()
            .map(|(level, level_locations)| {
                let chain = hierarchies.get(level).map(Vec::as_slice).unwrap_or_default();
                let level_geometry = geometry
                    .as_ref()
                    .filter(|(geometry_level, _)| geometry_level == level)
                    .map(|(_, features)| features);

                (
                    level.key().to_string(),
                    build_level_options(level_locations, chain, level_geometry),
                )
            })
            .collect();

        Ok(options)
    }

    /// Boundary features for every location at the boundary level's own
    /// geographic level
    async fn load_geometry(
        &self,
        boundary_level_id: BoundaryLevelId,
        by_level: &BTreeMap<GeographicLevel, Vec<&Location>>,
    ) -> Result<(GeographicLevel, GeometryByCode)> {
        let boundary_level = self
            .boundary_levels
            .get_boundary_level(boundary_level_id)
            .await?
            .ok_or(TableBuilderError::BoundaryLevelNotFound { id: boundary_level_id })?;

        let mut seen = HashSet::new();
        let codes: Vec<String> = by_level
            .get(&boundary_level.level)
            .into_iter()
            .flatten()
            .filter(|location| seen.insert(location.code.as_str()))
            .map(|location| location.code.clone())
            .collect();

        if codes.is_empty() {
            return Ok((boundary_level.level, GeometryByCode::new()));
        }

        let boundaries = self
            .boundary_data
            .find_by_boundary_level_and_codes(boundary_level_id, &codes)
            .await?;

        tracing::debug!(
            "Found {} of {} boundaries in level {} ({})",
            boundaries.len(),
            codes.len(),
            boundary_level_id,
            boundary_level.label
        );

        let features =
            boundaries.into_iter().map(|(code, data)| (code, data.to_feature())).collect();

        Ok((boundary_level.level, features))
    }
}
