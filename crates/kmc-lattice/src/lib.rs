//! `kmc-lattice` — charge-transport collaborators for the KMC engine.
//!
//! The engine consumes a flat map of per-site outgoing rates and knows
//! nothing about geometry or physics.  This crate supplies the two helpers a
//! charge-transport application typically builds that map from:
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`cubic`]  | `Cubic` — position ↔ site-id mapping on an LxWxH lattice |
//! | [`marcus`] | `Marcus` — semi-classical Marcus hop-rate calculator      |
//! | [`error`]  | `LatticeError`, `LatticeResult<T>`                        |

pub mod cubic;
pub mod error;
pub mod marcus;

#[cfg(test)]
mod tests;

pub use cubic::{BoundarySetting, Cubic};
pub use error::{LatticeError, LatticeResult};
pub use marcus::Marcus;
