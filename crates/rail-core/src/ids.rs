//! Strongly typed, zero-cost identifier wrappers.
//!
//! Station and line ids are positions in the tables produced by the most
//! recent network rebuild, so they are only meaningful against that
//! `RailNetwork`.  Identity that must survive a rebuild uses
//! [`FeatureKey`](crate::FeatureKey) instead.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a station in the rebuilt station table.
    pub struct StationId(u32);
}

typed_id! {
    /// Index of a line in the rebuilt line table.
    pub struct LineId(u32);
}

typed_id! {
    /// Identity of a simulated train.  Reissued on every network rebuild.
    pub struct TrainId(u32);
}

typed_id! {
    /// Identity of a passenger.  Monotonic over the whole run, hence `u64`.
    pub struct PassengerId(u64);
}

typed_id! {
    /// Identity of a service incident.
    pub struct IncidentId(u32);
}
