//! `kmc-output` — result writers for KMC simulations.
//!
//! The engine itself persists nothing; callers sample walker state and
//! cluster introspection at whatever cadence they measure, build plain rows,
//! and hand them to a writer.
//!
//! # Crate layout
//!
//! | Module     | Contents                                   |
//! |------------|--------------------------------------------|
//! | [`row`]    | Plain data row types                       |
//! | [`writer`] | `OutputWriter` trait                       |
//! | [`csv`]    | `CsvWriter` backend                        |
//! | [`error`]  | `OutputError`, `OutputResult<T>`           |

pub mod csv;
pub mod error;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use crate::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use row::{ClusterSummaryRow, TrajectoryRow};
pub use writer::OutputWriter;
