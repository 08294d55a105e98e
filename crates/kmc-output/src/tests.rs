//! Integration tests for kmc-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::CsvWriter;
    use crate::row::{ClusterSummaryRow, TrajectoryRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn trajectory_row(walker_id: u32, hop: u64) -> TrajectoryRow {
        TrajectoryRow {
            walker_id,
            hop,
            time: hop as f64 * 0.25,
            site_id: walker_id * 10 + hop as u32,
        }
    }

    fn summary_row(cluster_id: u32) -> ClusterSummaryRow {
        ClusterSummaryRow {
            cluster_id,
            resolution: 2.0,
            time_increment: 0.5,
            site_ids: vec![cluster_id * 2, cluster_id * 2 + 1],
        }
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("trajectories.csv").exists());
        assert!(dir.path().join("cluster_summaries.csv").exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("trajectories.csv")).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, ["walker_id", "hop", "time", "site_id"]);

        let mut rdr2 = csv::Reader::from_path(dir.path().join("cluster_summaries.csv")).unwrap();
        let headers2: Vec<_> = rdr2.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(
            headers2,
            ["cluster_id", "resolution", "time_increment", "site_count", "site_ids"]
        );
    }

    #[test]
    fn csv_trajectory_round_trip() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let rows = vec![trajectory_row(0, 1), trajectory_row(0, 2), trajectory_row(1, 1)];
        w.write_trajectories(&rows).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("trajectories.csv")).unwrap();
        let read: Vec<TrajectoryRow> = rdr
            .records()
            .map(|record| {
                let record = record.unwrap();
                TrajectoryRow {
                    walker_id: record[0].parse().unwrap(),
                    hop: record[1].parse().unwrap(),
                    time: record[2].parse().unwrap(),
                    site_id: record[3].parse().unwrap(),
                }
            })
            .collect();
        assert_eq!(read, rows);
    }

    #[test]
    fn csv_cluster_summary_members_joined() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_cluster_summaries(&[summary_row(3)]).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("cluster_summaries.csv")).unwrap();
        let record = rdr.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "3");
        assert_eq!(&record[3], "2");
        assert_eq!(&record[4], "6;7");
    }

    #[test]
    fn finish_twice_is_harmless() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}
