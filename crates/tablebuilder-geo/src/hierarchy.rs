//! Recursive nesting of locations by ancestor chain
//!
//! Each call partitions its locations by one ancestor level, in first-seen
//! order, and recurses into every partition with the rest of the chain. An
//! empty chain emits the locations themselves as leaves.

use geojson::Feature;
use std::collections::HashMap;
use tablebuilder_core::error::{Result, TableBuilderError};
use tablebuilder_core::models::{
    GeographicLevel, Location, LocationAttribute, LocationChildren, LocationGroupViewModel,
    LocationLeafViewModel, LocationViewModel,
};

/// Boundary features keyed by location code
pub type GeometryByCode = HashMap<String, Feature>;

/// Check that an ancestor chain runs coarsest to finest and stays above `level`
pub fn validate_chain(level: GeographicLevel, chain: &[GeographicLevel]) -> Result<()> {
    if let Some(ancestor) = chain.iter().find(|ancestor| !level.can_nest_under(**ancestor)) {
        return Err(TableBuilderError::InvalidHierarchy {
            level,
            reason: format!("{} is not a coarser level than {}", ancestor, level),
        });
    }

    if let Some(pair) = chain.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(TableBuilderError::InvalidHierarchy {
            level,
            reason: format!("{} must come after {} in the ancestor chain", pair[0], pair[1]),
        });
    }

    Ok(())
}

/// Options for the locations of one level.
///
/// With an empty chain the result is one leaf per location in input order,
/// otherwise one group per distinct first ancestor. Leaves take their
/// geometry from `geometry` when given.
pub fn build_level_options(
    locations: &[&Location],
    chain: &[GeographicLevel],
    geometry: Option<&GeometryByCode>,
) -> Vec<LocationViewModel> {
    match nest(locations, chain, geometry) {
        LocationChildren::Leaves(leaves) => {
            leaves.into_iter().map(LocationViewModel::Leaf).collect()
        }
        LocationChildren::Groups(groups) => {
            groups.into_iter().map(LocationViewModel::Group).collect()
        }
    }
}

fn nest(
    locations: &[&Location],
    chain: &[GeographicLevel],
    geometry: Option<&GeometryByCode>,
) -> LocationChildren {
    let Some((&level, rest)) = chain.split_first() else {
        return LocationChildren::Leaves(
            locations.iter().map(|location| leaf(location, geometry)).collect(),
        );
    };

    LocationChildren::Groups(
        partition_by_ancestor(locations, level)
            .into_iter()
            .map(|(attribute, members)| LocationGroupViewModel {
                label: attribute.label,
                value: attribute.code,
                level,
                options: nest(&members, rest, geometry),
            })
            .collect(),
    )
}

/// Split locations by their ancestor at `level`, keeping first-seen order of
/// both the partitions and the locations inside them. Locations without an
/// ancestor at that level share one partition with an empty code and label.
fn partition_by_ancestor<'a>(
    locations: &[&'a Location],
    level: GeographicLevel,
) -> Vec<(LocationAttribute, Vec<&'a Location>)> {
    let mut partitions: Vec<(LocationAttribute, Vec<&'a Location>)> = Vec::new();
    let mut positions: HashMap<LocationAttribute, usize> = HashMap::new();

    for &location in locations {
        let attribute = location.ancestor(level).cloned().unwrap_or_default();
        match positions.get(&attribute) {
            Some(&position) => partitions[position].1.push(location),
            None => {
                positions.insert(attribute.clone(), partitions.len());
                partitions.push((attribute, vec![location]));
            }
        }
    }

    partitions
}

fn leaf(location: &Location, geometry: Option<&GeometryByCode>) -> LocationLeafViewModel {
    LocationLeafViewModel {
        id: location.id,
        label: location.label.clone(),
        value: location.code.clone(),
        geo_json: geometry.and_then(|features| features.get(&location.code)).cloned(),
    }
}
