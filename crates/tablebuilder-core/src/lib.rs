//! Table Builder Core - Domain models, time periods, and configuration
//!
//! This crate contains the domain types shared by every table-builder crate:
//! locations and geographic levels, observations, the query context, boundary
//! geometry, location view models, and the total order over time periods.

pub mod config;
pub mod error;
pub mod models;
pub mod time_period;

pub use error::{Result, TableBuilderError};
pub use time_period::{PeriodFamily, TimeIdentifier, TimePeriod, TimePeriodRange};
