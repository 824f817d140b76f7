//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an aggregate root.
///
/// Integer-backed; fresh values come from an [`IdSequence`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn from_i64(value: i64) -> Self {
                Self(value)
            }

            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(AggregateId, "AggregateId");

/// Source of fresh aggregate identifiers.
///
/// Values are seeded from the wall clock (milliseconds since the Unix epoch)
/// and are strictly increasing, so two ids requested within the same
/// millisecond still differ.
#[derive(Debug, Clone)]
pub struct IdSequence {
    last: i64,
    clock: bool,
}

impl IdSequence {
    /// Sequence whose first id is at least the current time in milliseconds.
    pub fn from_clock() -> Self {
        Self { last: 0, clock: true }
    }

    /// Deterministic sequence; the first id handed out is `last + 1`.
    ///
    /// Prefer this in tests.
    pub fn starting_after(last: i64) -> Self {
        Self { last, clock: false }
    }

    /// Make sure ids already in use (e.g. seeded data) are never handed out again.
    pub fn observe(&mut self, id: AggregateId) {
        self.last = self.last.max(id.as_i64());
    }

    /// Next fresh identifier.
    pub fn next_id(&mut self) -> AggregateId {
        let mut next = self.last + 1;
        if self.clock {
            next = next.max(chrono::Utc::now().timestamp_millis());
        }
        self.last = next;
        AggregateId(next)
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::from_clock()
    }
}
