//! `kmc-engine` — the adaptive coarse-graining kinetic Monte Carlo engine.
//!
//! Walkers hop between sites connected by directional rates.  When a walker
//! keeps oscillating inside a tightly coupled basin, the engine detects the
//! basin, solves its steady-state master equation, and substitutes a single
//! aggregated cluster feature for the member sites, so the walker loop takes
//! one statistically equivalent macro-step instead of thousands of
//! micro-hops.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                |
//! |-------------|---------------------------------------------------------|
//! | [`system`]  | `CoarseGrainSystem` — public API, hop loop, coarse grainer |
//! | [`site`]    | `Site` topology feature                                 |
//! | [`cluster`] | `Cluster` topology feature, master-equation solve       |
//! | [`basin`]   | `BasinExplorer` — candidate basin discovery             |
//! | [`feature`] | `Feature` / `Dispatch` — site-or-cluster lookup         |
//! | [`walker`]  | `Walker` — position + pre-sampled next move             |
//! | [`error`]   | `EngineError`, `EngineResult<T>`                        |
//!
//! # Example
//!
//! ```rust,ignore
//! let mut system = CoarseGrainSystem::new();
//! system.set_random_seed(7)?;
//! system.set_time_resolution(0.5)?;
//! system.initialize_system(rates)?;
//!
//! let mut walkers = vec![(WalkerId(0), Walker::on_site(SiteId(0)))];
//! system.initialize_walkers(&mut walkers)?;
//! let mut elapsed = 0.0;
//! for _ in 0..10_000 {
//!     let (id, walker) = &mut walkers[0];
//!     elapsed += walker.dwell_time();
//!     system.hop(*id, walker)?;
//! }
//! ```

pub mod basin;
pub mod cluster;
pub mod error;
pub mod feature;
pub mod site;
pub mod system;
pub mod walker;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use basin::BasinExplorer;
pub use cluster::{Cluster, Convergence, DEFAULT_CONVERGENCE_TOLERANCE};
pub use error::{EngineError, EngineResult};
pub use feature::{Dispatch, Feature};
pub use site::Site;
pub use system::{CoarseGrainSystem, ITERATIONS_UNLIMITED};
pub use walker::Walker;
