//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `trajectories.csv`
//! - `cluster_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{ClusterSummaryRow, OutputResult, TrajectoryRow};

/// Writes simulation results to two CSV files.
pub struct CsvWriter {
    trajectories: Writer<File>,
    summaries: Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut trajectories = Writer::from_path(dir.join("trajectories.csv"))?;
        trajectories.write_record(["walker_id", "hop", "time", "site_id"])?;

        let mut summaries = Writer::from_path(dir.join("cluster_summaries.csv"))?;
        summaries.write_record([
            "cluster_id",
            "resolution",
            "time_increment",
            "site_count",
            "site_ids",
        ])?;

        Ok(Self {
            trajectories,
            summaries,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_trajectories(&mut self, rows: &[TrajectoryRow]) -> OutputResult<()> {
        for row in rows {
            self.trajectories.write_record(&[
                row.walker_id.to_string(),
                row.hop.to_string(),
                row.time.to_string(),
                row.site_id.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_cluster_summaries(&mut self, rows: &[ClusterSummaryRow]) -> OutputResult<()> {
        for row in rows {
            let members = row
                .site_ids
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(";");
            self.summaries.write_record(&[
                row.cluster_id.to_string(),
                row.resolution.to_string(),
                row.time_increment.to_string(),
                row.site_ids.len().to_string(),
                members,
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.trajectories.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
