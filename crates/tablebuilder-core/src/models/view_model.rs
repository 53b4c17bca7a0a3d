//! Location options rendered as nested groups

use geojson::Feature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{GeographicLevel, LocationId};

/// Location options keyed by geographic-level key (`localAuthority`, ...)
pub type LocationOptions = BTreeMap<String, Vec<LocationViewModel>>;

/// Ancestor chain to nest each level by, coarsest first, excluding the
/// level itself
pub type LocationHierarchies = BTreeMap<GeographicLevel, Vec<GeographicLevel>>;

/// A leaf option: one input location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationLeafViewModel {
    pub id: LocationId,

    pub label: String,

    /// Location code
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_json: Option<Feature>,
}

/// A group option: one ancestor entity grouping the options beneath it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationGroupViewModel {
    pub label: String,

    /// Ancestor code
    pub value: String,

    pub level: GeographicLevel,

    pub options: LocationChildren,
}

/// Children of a group: all groups or all leaves, never mixed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationChildren {
    Groups(Vec<LocationGroupViewModel>),
    Leaves(Vec<LocationLeafViewModel>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationViewModel {
    Group(LocationGroupViewModel),
    Leaf(LocationLeafViewModel),
}

impl LocationViewModel {
    pub fn label(&self) -> &str {
        match self {
            LocationViewModel::Group(group) => &group.label,
            LocationViewModel::Leaf(leaf) => &leaf.label,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            LocationViewModel::Group(group) => &group.value,
            LocationViewModel::Leaf(leaf) => &leaf.value,
        }
    }

    /// Location id; only leaves carry one
    pub fn id(&self) -> Option<LocationId> {
        match self {
            LocationViewModel::Group(_) => None,
            LocationViewModel::Leaf(leaf) => Some(leaf.id),
        }
    }

    /// Level of the grouped ancestor; only groups carry one
    pub fn level(&self) -> Option<GeographicLevel> {
        match self {
            LocationViewModel::Group(group) => Some(group.level),
            LocationViewModel::Leaf(_) => None,
        }
    }

    pub fn options(&self) -> Option<&LocationChildren> {
        match self {
            LocationViewModel::Group(group) => Some(&group.options),
            LocationViewModel::Leaf(_) => None,
        }
    }

    pub fn geo_json(&self) -> Option<&Feature> {
        match self {
            LocationViewModel::Group(_) => None,
            LocationViewModel::Leaf(leaf) => leaf.geo_json.as_ref(),
        }
    }

    /// All leaves beneath this option, depth first
    pub fn leaves(&self) -> Vec<&LocationLeafViewModel> {
        match self {
            LocationViewModel::Leaf(leaf) => vec![leaf],
            LocationViewModel::Group(group) => group.leaves(),
        }
    }
}

impl LocationGroupViewModel {
    pub fn leaves(&self) -> Vec<&LocationLeafViewModel> {
        match &self.options {
            LocationChildren::Leaves(leaves) => leaves.iter().collect(),
            LocationChildren::Groups(groups) => groups.iter().flat_map(|g| g.leaves()).collect(),
        }
    }
}
