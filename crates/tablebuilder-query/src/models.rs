use serde::{Deserialize, Serialize};
use tablebuilder_core::models::{LocationOptions, Observation, ObservationQueryContext};
use tablebuilder_core::time_period::{TimePeriod, TimePeriodRange};

/// Estimated result size of a query, per dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub time_periods: u64,
    pub locations: u64,
    pub indicators: u64,

    /// Sum of the registered item counts of every filter the query touches
    pub filter_item_combinations: u64,
}

impl CostEstimate {
    /// Estimated table cells, saturating at `u64::MAX`
    pub fn cells(&self) -> u64 {
        self.cells_per_location().saturating_mul(self.locations)
    }

    /// Cells contributed by each location
    pub fn cells_per_location(&self) -> u64 {
        self.time_periods
            .saturating_mul(self.indicators)
            .saturating_mul(self.filter_item_combinations)
    }
}

/// One dimension narrowed by cropping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dimension", rename_all = "camelCase")]
pub enum Cropping {
    #[serde(rename_all = "camelCase")]
    TimePeriod {
        original: TimePeriodRange,
        cropped: TimePeriodRange,
        original_count: usize,
        cropped_count: usize,
    },

    #[serde(rename_all = "camelCase")]
    Locations { original_count: usize, cropped_count: usize },
}

/// What cropping did to a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropReport {
    pub max_table_cells_allowed: u64,
    pub original_cells: u64,
    pub cropped_cells: u64,
    pub croppings: Vec<Cropping>,
}

impl CropReport {
    pub fn is_cropped(&self) -> bool {
        !self.croppings.is_empty()
    }
}

/// A query after cropping, with the report of what changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CroppedQuery {
    pub query: ObservationQueryContext,
    pub report: CropReport,
}

/// Everything a table needs: the rows, their periods, and the location options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBuilderResult {
    /// The query that was executed, after any cropping
    pub query: ObservationQueryContext,

    /// Matched rows in ascending time-period order
    pub observations: Vec<Observation>,

    /// Distinct periods present in the rows, ascending
    pub time_periods: Vec<TimePeriod>,

    /// Option trees for the locations present in the rows
    pub locations: LocationOptions,

    pub cropping: CropReport,
}
