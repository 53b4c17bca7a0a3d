use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{FilterId, FilterItemId, IndicatorId, LocationId, ObservationId, SubjectId};
use crate::time_period::{TimeIdentifier, TimePeriod};

/// One fact row of a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: ObservationId,

    pub subject_id: SubjectId,

    pub year: i32,

    pub time_identifier: TimeIdentifier,

    pub location_id: LocationId,

    /// The filter-item combination tagging this row: one item per filter
    #[serde(default)]
    pub filter_items: BTreeMap<FilterId, FilterItemId>,

    /// Indicator values, kept as text to preserve the published formatting
    #[serde(default)]
    pub measures: BTreeMap<IndicatorId, String>,
}

impl Observation {
    pub fn time_period(&self) -> TimePeriod {
        TimePeriod::new(self.year, self.time_identifier)
    }

    pub fn measure(&self, indicator: IndicatorId) -> Option<&str> {
        self.measures.get(&indicator).map(String::as_str)
    }

    pub fn filter_item_ids(&self) -> impl Iterator<Item = FilterItemId> + '_ {
        self.filter_items.values().copied()
    }
}
