//! Table Builder Store - Collaborator ports and adapters
//!
//! This crate defines the ports through which the table builder reads
//! observations, locations, filter cardinalities and boundary geometry, and
//! provides in-memory adapters for development and testing.

pub mod memory;
pub mod ports;
