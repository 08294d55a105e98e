//! `kmc-core` — foundational types for the `rust_kmc` kinetic Monte Carlo
//! framework.
//!
//! This crate is a dependency of every other `kmc-*` crate.  It intentionally
//! has no `kmc-*` dependencies and minimal external ones (only `rand`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module  | Contents                                  |
//! |---------|-------------------------------------------|
//! | [`ids`] | `SiteId`, `ClusterId`, `WalkerId`         |
//! | [`rng`] | `FeatureRng` (per-site / per-cluster RNG) |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |

pub mod ids;
pub mod rng;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use ids::{ClusterId, SiteId, WalkerId};
pub use rng::FeatureRng;
