//! Table Builder Geo - Location hierarchies and boundary geometry
//!
//! This crate nests flat location lists into per-level option trees and
//! decorates the leaves with boundary geometry fetched in one batch.

pub mod builder;
pub mod hierarchy;

pub use builder::LocationHierarchyBuilder;
