pub mod boundary;
pub mod ids;
pub mod location;
pub mod observation;
pub mod query;
pub mod view_model;

pub use boundary::{BoundaryData, BoundaryLevel, BoundaryLevelId};
pub use ids::{FilterId, FilterItemId, IndicatorId, LocationId, ObservationId, SubjectId};
pub use location::{GeographicLevel, Location, LocationAttribute};
pub use observation::Observation;
pub use query::{LocationQuery, ObservationPredicate, ObservationQueryContext};
pub use view_model::{
    LocationChildren, LocationGroupViewModel, LocationHierarchies, LocationLeafViewModel,
    LocationOptions, LocationViewModel,
};
