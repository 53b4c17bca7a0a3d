use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::LocationId;
use crate::error::{Result, TableBuilderError};

/// Geographic level of a location.
///
/// Declared from coarsest to finest; a location may only reference ancestors
/// at levels declared before its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeographicLevel {
    Country,
    EnglishDevolvedArea,
    Region,
    RscRegion,
    MayoralCombinedAuthority,
    LocalEnterprisePartnership,
    OpportunityArea,
    LocalAuthority,
    LocalAuthorityDistrict,
    ParliamentaryConstituency,
    Ward,
    PlanningArea,
    MultiAcademyTrust,
    Sponsor,
    School,
    Provider,
    Institution,
}

impl GeographicLevel {
    pub const ALL: [GeographicLevel; 17] = [
        GeographicLevel::Country,
        GeographicLevel::EnglishDevolvedArea,
        GeographicLevel::Region,
        GeographicLevel::RscRegion,
        GeographicLevel::MayoralCombinedAuthority,
        GeographicLevel::LocalEnterprisePartnership,
        GeographicLevel::OpportunityArea,
        GeographicLevel::LocalAuthority,
        GeographicLevel::LocalAuthorityDistrict,
        GeographicLevel::ParliamentaryConstituency,
        GeographicLevel::Ward,
        GeographicLevel::PlanningArea,
        GeographicLevel::MultiAcademyTrust,
        GeographicLevel::Sponsor,
        GeographicLevel::School,
        GeographicLevel::Provider,
        GeographicLevel::Institution,
    ];

    /// Lower-camel key used in view-model mappings, e.g. `localAuthority`
    pub fn key(self) -> &'static str {
        match self {
            GeographicLevel::Country => "country",
            GeographicLevel::EnglishDevolvedArea => "englishDevolvedArea",
            GeographicLevel::Region => "region",
            GeographicLevel::RscRegion => "rscRegion",
            GeographicLevel::MayoralCombinedAuthority => "mayoralCombinedAuthority",
            GeographicLevel::LocalEnterprisePartnership => "localEnterprisePartnership",
            GeographicLevel::OpportunityArea => "opportunityArea",
            GeographicLevel::LocalAuthority => "localAuthority",
            GeographicLevel::LocalAuthorityDistrict => "localAuthorityDistrict",
            GeographicLevel::ParliamentaryConstituency => "parliamentaryConstituency",
            GeographicLevel::Ward => "ward",
            GeographicLevel::PlanningArea => "planningArea",
            GeographicLevel::MultiAcademyTrust => "multiAcademyTrust",
            GeographicLevel::Sponsor => "sponsor",
            GeographicLevel::School => "school",
            GeographicLevel::Provider => "provider",
            GeographicLevel::Institution => "institution",
        }
    }

    /// Whether `ancestor` is a coarser level this level can nest under
    pub fn can_nest_under(self, ancestor: GeographicLevel) -> bool {
        ancestor < self
    }
}

impl fmt::Display for GeographicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for GeographicLevel {
    type Err = TableBuilderError;

    fn from_str(s: &str) -> Result<Self> {
        GeographicLevel::ALL
            .into_iter()
            .find(|level| level.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| TableBuilderError::UnknownGeographicLevel { key: s.to_string() })
    }
}

/// Code and label of a geographic entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationAttribute {
    pub code: String,
    pub label: String,
}

impl LocationAttribute {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self { code: code.into(), label: label.into() }
    }
}

/// A geographic entity at exactly one level, with its coarser ancestors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,

    pub geographic_level: GeographicLevel,

    /// Machine code, e.g. `E09000001`
    pub code: String,

    /// Human label, e.g. `City of London`
    pub label: String,

    /// Ancestor entities keyed by their level
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ancestors: BTreeMap<GeographicLevel, LocationAttribute>,
}

impl Location {
    pub fn new(
        id: LocationId,
        geographic_level: GeographicLevel,
        code: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id,
            geographic_level,
            code: code.into(),
            label: label.into(),
            ancestors: BTreeMap::new(),
        }
    }

    /// Attach an ancestor; the level must be coarser than the location's own
    pub fn with_ancestor(
        mut self,
        level: GeographicLevel,
        code: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<Self> {
        if !self.geographic_level.can_nest_under(level) {
            return Err(TableBuilderError::InvalidLocation {
                code: self.code,
                reason: format!(
                    "{} is not a coarser level than {}",
                    level, self.geographic_level
                ),
            });
        }
        self.ancestors.insert(level, LocationAttribute::new(code, label));
        Ok(self)
    }

    pub fn ancestor(&self, level: GeographicLevel) -> Option<&LocationAttribute> {
        self.ancestors.get(&level)
    }

    /// Check that every ancestor sits at a coarser level
    pub fn validate(&self) -> Result<()> {
        match self.ancestors.keys().find(|level| !self.geographic_level.can_nest_under(**level)) {
            Some(level) => Err(TableBuilderError::InvalidLocation {
                code: self.code.clone(),
                reason: format!("{} is not a coarser level than {}", level, self.geographic_level),
            }),
            None => Ok(()),
        }
    }
}
