//! Opaque identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a location
    LocationId
);
uuid_id!(
    /// Identifier of a subject (one fact table within a release)
    SubjectId
);
uuid_id!(
    /// Identifier of an indicator column
    IndicatorId
);
uuid_id!(
    /// Identifier of a filter (e.g. "Gender")
    FilterId
);
uuid_id!(
    /// Identifier of a filter item (e.g. "Female")
    FilterItemId
);
uuid_id!(
    /// Identifier of an observation row
    ObservationId
);
