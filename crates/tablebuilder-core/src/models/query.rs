use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::{FilterItemId, GeographicLevel, IndicatorId, LocationId, Observation, SubjectId};
use crate::time_period::{TimePeriod, TimePeriodRange};

/// Location selector of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationQuery {
    /// Explicit locations, in the order the caller listed them
    Ids(Vec<LocationId>),

    /// Location codes per geographic level
    Codes(BTreeMap<GeographicLevel, Vec<String>>),
}

impl LocationQuery {
    /// Number of locations the selector names
    pub fn location_count(&self) -> usize {
        match self {
            LocationQuery::Ids(ids) => ids.iter().collect::<HashSet<_>>().len(),
            LocationQuery::Codes(codes) => codes
                .values()
                .map(|level_codes| level_codes.iter().collect::<HashSet<_>>().len())
                .sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            LocationQuery::Ids(ids) => ids.is_empty(),
            LocationQuery::Codes(codes) => codes.values().all(Vec::is_empty),
        }
    }
}

/// A table query: one subject plus optional constraints.
///
/// Every constraint except the subject is optional; an absent or empty
/// constraint leaves that dimension unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationQueryContext {
    pub subject_id: SubjectId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<Vec<IndicatorId>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<LocationQuery>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_period: Option<TimePeriodRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_items: Option<Vec<FilterItemId>>,
}

impl ObservationQueryContext {
    /// Create an unconstrained query over a subject
    pub fn new(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            indicators: None,
            locations: None,
            time_period: None,
            filter_items: None,
        }
    }

    pub fn with_indicators(mut self, indicators: impl IntoIterator<Item = IndicatorId>) -> Self {
        self.indicators = Some(indicators.into_iter().collect());
        self
    }

    pub fn with_location_ids(mut self, ids: impl IntoIterator<Item = LocationId>) -> Self {
        self.locations = Some(LocationQuery::Ids(ids.into_iter().collect()));
        self
    }

    pub fn with_location_codes(mut self, codes: BTreeMap<GeographicLevel, Vec<String>>) -> Self {
        self.locations = Some(LocationQuery::Codes(codes));
        self
    }

    pub fn with_time_period(mut self, start: TimePeriod, end: TimePeriod) -> Self {
        self.time_period = Some(TimePeriodRange::new(start, end));
        self
    }

    pub fn with_filter_items(mut self, items: impl IntoIterator<Item = FilterItemId>) -> Self {
        self.filter_items = Some(items.into_iter().collect());
        self
    }

    /// Requested indicators, `None` when unconstrained
    pub fn indicator_ids(&self) -> Option<&[IndicatorId]> {
        self.indicators.as_deref().filter(|ids| !ids.is_empty())
    }

    /// Requested filter items, `None` when unconstrained
    pub fn filter_item_ids(&self) -> Option<&[FilterItemId]> {
        self.filter_items.as_deref().filter(|ids| !ids.is_empty())
    }

    /// Location selector, `None` when unconstrained
    pub fn location_query(&self) -> Option<&LocationQuery> {
        self.locations.as_ref().filter(|query| !query.is_empty())
    }
}

/// Row-level constraints compiled from a query, with location selectors
/// already resolved to location ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationPredicate {
    pub subject_id: SubjectId,
    pub indicators: Option<BTreeSet<IndicatorId>>,
    pub location_ids: Option<HashSet<LocationId>>,
    pub time_period: Option<TimePeriodRange>,
    pub filter_items: Option<BTreeSet<FilterItemId>>,
}

impl ObservationPredicate {
    /// Predicate for a query whose locations resolved to `location_ids`
    pub fn new(query: &ObservationQueryContext, location_ids: Option<HashSet<LocationId>>) -> Self {
        Self {
            subject_id: query.subject_id,
            indicators: query.indicator_ids().map(|ids| ids.iter().copied().collect()),
            location_ids,
            time_period: query.time_period,
            filter_items: query.filter_item_ids().map(|ids| ids.iter().copied().collect()),
        }
    }

    pub fn matches(&self, observation: &Observation) -> bool {
        if observation.subject_id != self.subject_id {
            return false;
        }

        if let Some(indicators) = &self.indicators {
            if !observation.measures.keys().any(|id| indicators.contains(id)) {
                return false;
            }
        }

        if let Some(location_ids) = &self.location_ids {
            if !location_ids.contains(&observation.location_id) {
                return false;
            }
        }

        if let Some(range) = &self.time_period {
            if !range.contains(&observation.time_period()) {
                return false;
            }
        }

        if let Some(filter_items) = &self.filter_items {
            if !observation.filter_item_ids().any(|id| filter_items.contains(&id)) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilterId, ObservationId};
    use crate::time_period::TimeIdentifier;

    fn observation(subject_id: SubjectId, year: i32, location_id: LocationId) -> Observation {
        Observation {
            id: ObservationId::new(),
            subject_id,
            year,
            time_identifier: TimeIdentifier::ACADEMIC_YEAR,
            location_id,
            filter_items: BTreeMap::new(),
            measures: BTreeMap::new(),
        }
    }

    #[test]
    fn test_empty_constraints_are_unconstrained() {
        let query = ObservationQueryContext::new(SubjectId::new())
            .with_indicators(Vec::new())
            .with_location_ids(Vec::new())
            .with_filter_items(Vec::new());

        assert!(query.indicator_ids().is_none());
        assert!(query.location_query().is_none());
        assert!(query.filter_item_ids().is_none());
    }

    #[test]
    fn test_location_count_ignores_duplicates() {
        let id = LocationId::new();
        assert_eq!(LocationQuery::Ids(vec![id, id, LocationId::new()]).location_count(), 2);

        let mut codes = BTreeMap::new();
        codes.insert(GeographicLevel::Country, vec!["E92000001".to_string()]);
        codes.insert(
            GeographicLevel::Region,
            vec!["E12000001".to_string(), "E12000002".to_string()],
        );
        assert_eq!(LocationQuery::Codes(codes).location_count(), 3);
    }

    #[test]
    fn test_predicate_time_range_is_inclusive() {
        let subject_id = SubjectId::new();
        let location_id = LocationId::new();
        let query = ObservationQueryContext::new(subject_id).with_time_period(
            TimePeriod::new(2010, TimeIdentifier::ACADEMIC_YEAR),
            TimePeriod::new(2011, TimeIdentifier::ACADEMIC_YEAR),
        );
        let predicate = ObservationPredicate::new(&query, None);

        assert!(predicate.matches(&observation(subject_id, 2010, location_id)));
        assert!(predicate.matches(&observation(subject_id, 2011, location_id)));
        assert!(!predicate.matches(&observation(subject_id, 2012, location_id)));
        assert!(!predicate.matches(&observation(SubjectId::new(), 2010, location_id)));
    }

    #[test]
    fn test_predicate_filter_items_intersect() {
        let subject_id = SubjectId::new();
        let wanted = FilterItemId::new();
        let query = ObservationQueryContext::new(subject_id).with_filter_items([wanted]);
        let predicate = ObservationPredicate::new(&query, None);

        let mut tagged = observation(subject_id, 2010, LocationId::new());
        tagged.filter_items.insert(FilterId::new(), wanted);
        tagged.filter_items.insert(FilterId::new(), FilterItemId::new());
        assert!(predicate.matches(&tagged));

        let mut other = observation(subject_id, 2010, LocationId::new());
        other.filter_items.insert(FilterId::new(), FilterItemId::new());
        assert!(!predicate.matches(&other));
    }

    #[test]
    fn test_query_json_shape() {
        let subject_id = SubjectId::new();
        let query = ObservationQueryContext::new(subject_id).with_time_period(
            TimePeriod::new(2010, TimeIdentifier::ACADEMIC_YEAR),
            TimePeriod::new(2011, TimeIdentifier::ACADEMIC_YEAR),
        );
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["timePeriod"]["start"]["timeIdentifier"], "AY");
        assert!(json.get("indicators").is_none());

        let back: ObservationQueryContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, query);
    }
}
