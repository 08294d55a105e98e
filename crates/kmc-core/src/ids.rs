//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct use of caller-assigned numbering via `id.0`, but callers should
//! prefer the `.index()` helpers for clarity.
//!
//! `SiteId` and `WalkerId` values are assigned by the caller; `ClusterId`
//! values are handed out by the engine, monotonically from zero.  The
//! `UNASSIGNED` sentinel marks a site that is not part of any cluster and a
//! walker that has not yet been placed.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to the maximum
            /// inner value.
            pub const UNASSIGNED: $name = $name(<$inner>::MAX);

            /// `true` unless this is the `UNASSIGNED` sentinel.
            #[inline(always)]
            pub fn is_assigned(self) -> bool {
                self != Self::UNASSIGNED
            }

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `UNASSIGNED` sentinel so uninitialized IDs are
            /// visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::UNASSIGNED
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
    /// Caller-assigned index of a lattice site.  Uniqueness is the caller's
    /// responsibility.
    pub struct SiteId(u32);
}

typed_id! {
    /// Engine-assigned index of a coarse-grained cluster.  Allocated
    /// monotonically; erased ids are never reused within a run.
    pub struct ClusterId(u32);
}

typed_id! {
    /// Caller-assigned index of a random walker.
    pub struct WalkerId(u32);
}
