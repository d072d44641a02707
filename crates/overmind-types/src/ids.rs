//! Strongly-typed identifiers.
//!
//! Unit tags come from the game engine as plain integers and are stable for
//! the lifetime of a unit. They are wrapped in [`UnitTag`] so that a tag can
//! never be confused with a tick number or a count. Command batches carry a
//! time-ordered [`BatchId`] (UUID v7) so dispatch logs can be correlated.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around a raw integer tag with standard derives.
macro_rules! define_tag {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Wrap a raw engine tag.
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Return the raw engine tag.
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for $inner {
            fn from(tag: $name) -> Self {
                tag.0
            }
        }
    };
}

define_tag! {
    /// Engine-assigned tag of a unit (friendly agent or enemy).
    ///
    /// Tags are unique across both sides, so an `AttackTarget` command can
    /// reference an enemy by the same type used to address agents.
    UnitTag(u64)
}

/// Unique identifier for one dispatched command batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for BatchId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_orders_by_raw_value() {
        let low = UnitTag::new(3);
        let high = UnitTag::new(11);
        assert!(low < high);
        assert_eq!(u64::from(high), 11);
    }

    #[test]
    fn tag_serializes_transparently() {
        let json = serde_json::to_string(&UnitTag::new(42)).ok();
        assert_eq!(json.as_deref(), Some("42"));
    }

    #[test]
    fn batch_ids_are_distinct() {
        let a = BatchId::new();
        let b = BatchId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }
}
