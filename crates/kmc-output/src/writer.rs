//! The backend-agnostic output writer trait.

use crate::{ClusterSummaryRow, OutputResult, TrajectoryRow};

/// An output backend for simulation results.
///
/// Implementations buffer freely; callers must invoke
/// [`finish`](Self::finish) once at the end of a run to flush.
pub trait OutputWriter {
    /// Append sampled walker positions.
    fn write_trajectories(&mut self, rows: &[TrajectoryRow]) -> OutputResult<()>;

    /// Append cluster snapshots.
    fn write_cluster_summaries(&mut self, rows: &[ClusterSummaryRow]) -> OutputResult<()>;

    /// Flush and close.  Safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
