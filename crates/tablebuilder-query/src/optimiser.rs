//! Query cost estimation and cropping
//!
//! The cost of a query is the number of cells its table would render:
//! time periods × locations × indicators × filter-item combinations. A
//! dimension the query leaves unconstrained counts as one. The
//! filter-item factor is the sum, over every distinct filter the query's
//! items belong to, of the items registered under that filter, and is read
//! from the filter-item repository on every call.
//!
//! Cropping keeps the earliest periods first and then the leading explicit
//! locations, until the estimate fits the configured ceiling.

use std::collections::HashSet;
use std::sync::Arc;
use tablebuilder_core::config::TableBuilderOptions;
use tablebuilder_core::error::Result;
use tablebuilder_core::models::{LocationId, LocationQuery, ObservationQueryContext};
use tablebuilder_store::ports::FilterItemRepository;
use tokio_util::sync::CancellationToken;

use crate::cancellation::cancellable;
use crate::models::{CostEstimate, CropReport, CroppedQuery, Cropping};

/// Estimates query cost and crops queries that exceed the cell ceiling
pub struct QueryOptimiser {
    filter_items: Arc<dyn FilterItemRepository>,
    options: TableBuilderOptions,
}

impl QueryOptimiser {
    pub fn new(filter_items: Arc<dyn FilterItemRepository>, options: TableBuilderOptions) -> Self {
        Self { filter_items, options }
    }

    pub fn options(&self) -> &TableBuilderOptions {
        &self.options
    }

    /// Per-dimension cost of a query
    pub async fn estimate(&self, query: &ObservationQueryContext) -> Result<CostEstimate> {
        let filter_item_combinations = match query.filter_item_ids() {
            None => 1,
            Some(items) => {
                let counts = self.filter_items.count_filter_items_by_filter(items).await?;
                counts.values().map(|count| *count as u64).sum()
            }
        };

        Ok(CostEstimate {
            time_periods: query.time_period.map_or(1, |range| range.period_count() as u64),
            locations: query.location_query().map_or(1, |locations| locations.location_count() as u64),
            indicators: query
                .indicator_ids()
                .map_or(1, |ids| ids.iter().collect::<HashSet<_>>().len() as u64),
            filter_item_combinations,
        })
    }

    /// Whether the estimated cells exceed the ceiling
    pub async fn is_cropping_required(&self, query: &ObservationQueryContext) -> Result<bool> {
        let estimate = self.estimate(query).await?;
        Ok(self.exceeds_budget(&estimate))
    }

    /// The query narrowed to fit the ceiling, or unchanged when it already fits
    pub async fn crop_query(
        &self,
        query: &ObservationQueryContext,
        cancel: &CancellationToken,
    ) -> Result<ObservationQueryContext> {
        Ok(self.crop_query_with_report(query, cancel).await?.query)
    }

    /// Like [`crop_query`](Self::crop_query), also reporting which dimensions
    /// were narrowed and by how much
    pub async fn crop_query_with_report(
        &self,
        query: &ObservationQueryContext,
        cancel: &CancellationToken,
    ) -> Result<CroppedQuery> {
        let mut estimate = cancellable(cancel, self.estimate(query)).await?;
        let original_cells = estimate.cells();
        let mut cropped = query.clone();
        let mut croppings = Vec::new();

        if self.exceeds_budget(&estimate) {
            if let Some(cropping) = self.crop_time_period(&mut cropped, &mut estimate) {
                croppings.push(cropping);
            }
        }

        if self.exceeds_budget(&estimate) {
            if let Some(cropping) = self.crop_locations(&mut cropped, &mut estimate) {
                croppings.push(cropping);
            }
        }

        let report = CropReport {
            max_table_cells_allowed: self.options.max_table_cells_allowed,
            original_cells,
            cropped_cells: estimate.cells(),
            croppings,
        };

        if report.is_cropped() {
            tracing::info!(
                "Cropped query for subject {} from {} to {} cells (limit {})",
                query.subject_id,
                report.original_cells,
                report.cropped_cells,
                report.max_table_cells_allowed
            );
        }

        Ok(CroppedQuery { query: cropped, report })
    }

    fn exceeds_budget(&self, estimate: &CostEstimate) -> bool {
        estimate.cells() > self.options.max_table_cells_allowed
    }

    /// Keep the start of the range and its first `cropped_table_max_rows` periods
    fn crop_time_period(
        &self,
        query: &mut ObservationQueryContext,
        estimate: &mut CostEstimate,
    ) -> Option<Cropping> {
        let original = query.time_period?;
        let cropped = original.truncated(self.options.cropped_table_max_rows)?;
        let original_count = original.period_count();
        let cropped_count = cropped.period_count();

        query.time_period = Some(cropped);
        estimate.time_periods = cropped_count as u64;

        Some(Cropping::TimePeriod { original, cropped, original_count, cropped_count })
    }

    /// Keep the longest prefix of explicit location ids that fits, never fewer
    /// than one location. Code selectors are left alone.
    fn crop_locations(
        &self,
        query: &mut ObservationQueryContext,
        estimate: &mut CostEstimate,
    ) -> Option<Cropping> {
        let Some(LocationQuery::Ids(ids)) = query.location_query() else {
            return None;
        };

        let per_location = estimate.cells_per_location().max(1);
        let allowed = (self.options.max_table_cells_allowed / per_location).max(1);

        let prefix = distinct_prefix(ids, allowed);
        if prefix.len() == ids.len() {
            return None;
        }

        let original_count = query.location_query().map_or(0, LocationQuery::location_count);
        let kept = LocationQuery::Ids(prefix);
        let cropped_count = kept.location_count();

        query.locations = Some(kept);
        estimate.locations = cropped_count as u64;

        Some(Cropping::Locations { original_count, cropped_count })
    }
}

/// Leading ids up to, but excluding, the first id that would bring the
/// number of distinct ids above `allowed`
fn distinct_prefix(ids: &[LocationId], allowed: u64) -> Vec<LocationId> {
    let mut seen = HashSet::new();
    ids.iter()
        .take_while(|id| seen.contains(*id) || ((seen.len() as u64) < allowed && seen.insert(**id)))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablebuilder_core::models::{FilterId, FilterItemId, IndicatorId, SubjectId};
    use tablebuilder_core::time_period::{TimeIdentifier, TimePeriod, Week};
    use tablebuilder_store::memory::MemoryFilterItemRepository;

    fn academic_year(year: i32) -> TimePeriod {
        TimePeriod::new(year, TimeIdentifier::ACADEMIC_YEAR)
    }

    fn options(max_table_cells_allowed: u64, cropped_table_max_rows: usize) -> TableBuilderOptions {
        TableBuilderOptions { max_table_cells_allowed, cropped_table_max_rows }
    }

    /// One filter with `item_count` items; returns the repository and one of the items
    fn filter_with_items(item_count: usize) -> (Arc<MemoryFilterItemRepository>, FilterItemId) {
        let repo = MemoryFilterItemRepository::new();
        let items: Vec<FilterItemId> = (0..item_count).map(|_| FilterItemId::new()).collect();
        repo.add_filter(FilterId::new(), items.clone());
        (Arc::new(repo), items[0])
    }

    #[tokio::test]
    async fn test_estimate_counts_registered_items_per_filter() {
        let repo = MemoryFilterItemRepository::new();
        let gender: Vec<FilterItemId> = (0..2).map(|_| FilterItemId::new()).collect();
        let phase: Vec<FilterItemId> = (0..4).map(|_| FilterItemId::new()).collect();
        repo.add_filter(FilterId::new(), gender.clone());
        repo.add_filter(FilterId::new(), phase.clone());
        let optimiser = QueryOptimiser::new(Arc::new(repo), TableBuilderOptions::default());

        let query = ObservationQueryContext::new(SubjectId::new())
            .with_indicators([IndicatorId::new(), IndicatorId::new()])
            .with_location_ids([LocationId::new(), LocationId::new(), LocationId::new()])
            .with_time_period(academic_year(2010), academic_year(2011))
            .with_filter_items([gender[0], phase[0], phase[1]]);

        let estimate = optimiser.estimate(&query).await.unwrap();
        assert_eq!(
            estimate,
            CostEstimate { time_periods: 2, locations: 3, indicators: 2, filter_item_combinations: 6 }
        );
        assert_eq!(estimate.cells(), 72);
    }

    #[tokio::test]
    async fn test_unconstrained_dimensions_count_as_one() {
        let optimiser = QueryOptimiser::new(
            Arc::new(MemoryFilterItemRepository::new()),
            TableBuilderOptions::default(),
        );
        let estimate = optimiser.estimate(&ObservationQueryContext::new(SubjectId::new())).await.unwrap();
        assert_eq!(estimate.cells(), 1);
    }

    #[tokio::test]
    async fn test_cropping_required_only_above_ceiling() {
        let (repo, item) = filter_with_items(1);
        let optimiser = QueryOptimiser::new(repo, options(20, 5));
        let locations = [LocationId::new(), LocationId::new()];

        let two_years = ObservationQueryContext::new(SubjectId::new())
            .with_time_period(academic_year(2010), academic_year(2011))
            .with_filter_items([item]);
        assert!(!optimiser.is_cropping_required(&two_years).await.unwrap());

        // 10 periods × 2 locations = 20 cells, exactly at the ceiling
        let at_ceiling = ObservationQueryContext::new(SubjectId::new())
            .with_location_ids(locations)
            .with_time_period(academic_year(2010), academic_year(2019))
            .with_filter_items([item]);
        assert!(!optimiser.is_cropping_required(&at_ceiling).await.unwrap());

        let over = at_ceiling.clone().with_time_period(academic_year(2010), academic_year(2026));
        assert!(optimiser.is_cropping_required(&over).await.unwrap());
    }

    #[tokio::test]
    async fn test_query_within_budget_is_unchanged() {
        let (repo, item) = filter_with_items(1);
        let optimiser = QueryOptimiser::new(repo, options(20, 5));
        let query = ObservationQueryContext::new(SubjectId::new())
            .with_time_period(academic_year(2010), academic_year(2011))
            .with_filter_items([item]);

        let cropped = optimiser.crop_query_with_report(&query, &CancellationToken::new()).await.unwrap();
        assert_eq!(cropped.query, query);
        assert!(!cropped.report.is_cropped());
        assert_eq!(cropped.report.original_cells, 2);
    }

    #[tokio::test]
    async fn test_crop_time_then_locations() {
        let (repo, item) = filter_with_items(4);
        let optimiser = QueryOptimiser::new(repo, options(20, 5));
        let locations: Vec<LocationId> = (0..5).map(|_| LocationId::new()).collect();
        let query = ObservationQueryContext::new(SubjectId::new())
            .with_location_ids(locations.clone())
            .with_time_period(academic_year(2000), academic_year(2010))
            .with_filter_items([item]);

        let cancel = CancellationToken::new();
        let cropped = optimiser.crop_query_with_report(&query, &cancel).await.unwrap();

        let range = cropped.query.time_period.unwrap();
        assert_eq!(range.start, academic_year(2000));
        assert_eq!(range.end, academic_year(2004));
        assert_eq!(cropped.query.locations, Some(LocationQuery::Ids(vec![locations[0]])));

        assert_eq!(cropped.report.original_cells, 11 * 5 * 4);
        assert_eq!(cropped.report.cropped_cells, 20);
        assert_eq!(
            cropped.report.croppings[1],
            Cropping::Locations { original_count: 5, cropped_count: 1 }
        );

        // Cropping again changes nothing
        let again = optimiser.crop_query(&cropped.query, &cancel).await.unwrap();
        assert_eq!(again, cropped.query);
    }

    #[tokio::test]
    async fn test_location_crop_keeps_longest_fitting_prefix() {
        let (repo, item) = filter_with_items(2);
        let optimiser = QueryOptimiser::new(repo, options(20, 5));
        let locations: Vec<LocationId> = (0..6).map(|_| LocationId::new()).collect();
        let query = ObservationQueryContext::new(SubjectId::new())
            .with_location_ids(locations.clone())
            .with_time_period(academic_year(2000), academic_year(2004))
            .with_filter_items([item]);

        // 5 periods × 2 items = 10 cells per location, so two locations fit
        let cropped = optimiser.crop_query(&query, &CancellationToken::new()).await.unwrap();
        assert_eq!(cropped.time_period, query.time_period);
        assert_eq!(cropped.locations, Some(LocationQuery::Ids(locations[..2].to_vec())));
    }

    #[tokio::test]
    async fn test_single_location_is_always_kept() {
        let (repo, item) = filter_with_items(50);
        let optimiser = QueryOptimiser::new(repo, options(20, 5));
        let locations: Vec<LocationId> = (0..3).map(|_| LocationId::new()).collect();
        let query = ObservationQueryContext::new(SubjectId::new())
            .with_location_ids(locations.clone())
            .with_filter_items([item]);

        let cropped = optimiser.crop_query_with_report(&query, &CancellationToken::new()).await.unwrap();
        assert_eq!(cropped.query.locations, Some(LocationQuery::Ids(vec![locations[0]])));
        assert_eq!(cropped.report.cropped_cells, 50);

        let again = optimiser.crop_query_with_report(&cropped.query, &CancellationToken::new()).await.unwrap();
        assert!(!again.report.is_cropped());
    }

    #[tokio::test]
    async fn test_code_selectors_are_not_narrowed() {
        let (repo, item) = filter_with_items(30);
        let optimiser = QueryOptimiser::new(repo, options(20, 5));
        let codes = std::collections::BTreeMap::from([(
            tablebuilder_core::models::GeographicLevel::Region,
            vec!["E12000001".to_string(), "E12000002".to_string()],
        )]);
        let query = ObservationQueryContext::new(SubjectId::new())
            .with_location_codes(codes)
            .with_filter_items([item]);

        let cropped = optimiser.crop_query(&query, &CancellationToken::new()).await.unwrap();
        assert_eq!(cropped, query);
    }

    #[tokio::test]
    async fn test_cardinality_is_read_on_every_call() {
        let repo = Arc::new(MemoryFilterItemRepository::new());
        let filter = FilterId::new();
        let item = FilterItemId::new();
        repo.add_filter(filter, [item]);
        let optimiser = QueryOptimiser::new(repo.clone(), options(20, 5));
        let query = ObservationQueryContext::new(SubjectId::new())
            .with_time_period(academic_year(2000), academic_year(2004))
            .with_filter_items([item]);

        assert!(!optimiser.is_cropping_required(&query).await.unwrap());

        repo.add_filter(filter, (0..4).map(|_| FilterItemId::new()));
        assert!(optimiser.is_cropping_required(&query).await.unwrap());
    }

    #[tokio::test]
    async fn test_crop_of_very_long_week_range() {
        let (repo, item) = filter_with_items(1);
        let optimiser = QueryOptimiser::new(repo, options(20, 5));
        let week = |year, number| TimePeriod::new(year, TimeIdentifier::Week(Week::new(number).unwrap()));
        let query = ObservationQueryContext::new(SubjectId::new())
            .with_time_period(week(0, 1), week(i32::MAX, 1))
            .with_filter_items([item]);

        let estimate = optimiser.estimate(&query).await.unwrap();
        assert_eq!(estimate.time_periods, i64::from(i32::MAX) as u64 * 52 + 1);

        let cropped = optimiser.crop_query_with_report(&query, &CancellationToken::new()).await.unwrap();
        let range = cropped.query.time_period.unwrap();
        assert_eq!(range.start, week(0, 1));
        assert_eq!(range.end, week(0, 5));
        assert_eq!(cropped.report.cropped_cells, 5);
    }

    #[tokio::test]
    async fn test_crop_honours_cancellation() {
        let (repo, item) = filter_with_items(4);
        let optimiser = QueryOptimiser::new(repo, options(20, 5));
        let query = ObservationQueryContext::new(SubjectId::new()).with_filter_items([item]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = optimiser.crop_query(&query, &cancel).await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_distinct_prefix_counts_duplicates_once() {
        let a = LocationId::new();
        let b = LocationId::new();
        let c = LocationId::new();
        assert_eq!(distinct_prefix(&[a, a, b, a, c], 2), vec![a, a, b, a]);
        assert_eq!(distinct_prefix(&[a, b], 5), vec![a, b]);
    }
}
