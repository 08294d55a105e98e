//! `kmc-graph` — directional hop-rate storage and path analysis.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                   |
//! |-----------|------------------------------------------------------------|
//! | [`rates`] | `RateStore` — the directed rate table, neighbor views, source/sink classification |
//! | [`paths`] | bottleneck-path search (`slowest_equilibration_time`)      |
//! | [`error`] | `GraphError`, `GraphResult<T>`                             |

pub mod error;
pub mod paths;
pub mod rates;

#[cfg(test)]
mod tests;

pub use error::{GraphError, GraphResult};
pub use paths::slowest_equilibration_time;
pub use rates::RateStore;
