//! Table Builder Query - Observation matching, cost cropping, and the table pipeline
//!
//! This crate finds the observation rows a table query selects, keeps the
//! query under the configured cell budget by cropping it, and composes both
//! with the location hierarchy builder into a single table-builder pipeline.

pub mod cancellation;
pub mod matcher;
pub mod models;
pub mod optimiser;
pub mod pipeline;

pub use matcher::ObservationMatcher;
pub use models::{CostEstimate, CropReport, CroppedQuery, Cropping, TableBuilderResult};
pub use optimiser::QueryOptimiser;
pub use pipeline::TableBuilderPipeline;
