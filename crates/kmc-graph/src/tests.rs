//! Unit tests for kmc-graph.

use std::collections::BTreeSet;

use kmc_core::SiteId;

use crate::{GraphError, RateStore};

fn store_from(edges: &[(u32, u32, f64)]) -> RateStore {
    let mut store = RateStore::new();
    for &(from, to, rate) in edges {
        store.add_rate(SiteId(from), SiteId(to), rate).unwrap();
    }
    store
}

fn members(ids: &[u32]) -> BTreeSet<SiteId> {
    ids.iter().map(|&i| SiteId(i)).collect()
}

#[cfg(test)]
mod rate_store {
    use super::*;

    #[test]
    fn add_and_get() {
        let store = store_from(&[(0, 1, 2.5), (1, 0, 0.5)]);
        assert_eq!(store.rate(SiteId(0), SiteId(1)), Some(2.5));
        assert_eq!(store.rate(SiteId(1), SiteId(0)), Some(0.5));
        assert_eq!(store.rate(SiteId(0), SiteId(2)), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn duplicate_rate_rejected() {
        let mut store = store_from(&[(0, 1, 1.0)]);
        let err = store.add_rate(SiteId(0), SiteId(1), 2.0).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateRate { .. }));
        // Original value untouched.
        assert_eq!(store.rate(SiteId(0), SiteId(1)), Some(1.0));
    }

    #[test]
    fn non_positive_rate_rejected() {
        let mut store = RateStore::new();
        assert!(store.add_rate(SiteId(0), SiteId(1), 0.0).is_err());
        assert!(store.add_rate(SiteId(0), SiteId(1), -1.0).is_err());
        assert!(store.add_rate(SiteId(0), SiteId(1), f64::NAN).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn set_rate_requires_existing_pair() {
        let mut store = store_from(&[(0, 1, 1.0)]);
        store.set_rate(SiteId(0), SiteId(1), 4.0).unwrap();
        assert_eq!(store.rate(SiteId(0), SiteId(1)), Some(4.0));

        let err = store.set_rate(SiteId(0), SiteId(2), 1.0).unwrap_err();
        assert!(matches!(err, GraphError::RateNotFound { .. }));
    }

    #[test]
    fn neighbor_views() {
        let store = store_from(&[(0, 1, 1.0), (0, 2, 3.0), (2, 0, 0.5)]);
        let out: Vec<_> = store.outgoing(SiteId(0)).collect();
        assert_eq!(out, vec![(SiteId(1), 1.0), (SiteId(2), 3.0)]);
        assert_eq!(store.incoming(SiteId(0)), vec![(SiteId(2), 0.5)]);
        assert_eq!(store.outgoing_count(SiteId(0)), 2);
        assert_eq!(store.incoming_count(SiteId(2)), 1);
        assert_eq!(store.total_outgoing(SiteId(0)), 4.0);
        assert_eq!(store.max_outgoing(SiteId(0)), Some(3.0));
    }

    #[test]
    fn drain_classification() {
        let store = store_from(&[(0, 1, 1.0)]);
        assert!(!store.is_drain(SiteId(0)));
        assert!(store.is_drain(SiteId(1)));
        assert_eq!(store.max_outgoing(SiteId(1)), None);
        assert_eq!(store.total_outgoing(SiteId(1)), 0.0);
        assert_eq!(store.drain_site_ids(), members(&[1]));
    }

    #[test]
    fn sources_and_sinks() {
        // 0 → 1 → 2, plus 1 ↔ 3
        let store = store_from(&[(0, 1, 1.0), (1, 2, 1.0), (1, 3, 1.0), (3, 1, 1.0)]);
        assert_eq!(store.sources(), vec![SiteId(0)]);
        assert_eq!(store.sinks(), vec![SiteId(2)]);
        assert_eq!(store.all_site_ids(), members(&[0, 1, 2, 3]));
    }
}

#[cfg(test)]
mod bottleneck_paths {
    use super::*;
    use crate::slowest_equilibration_time;

    #[test]
    fn single_member_is_zero() {
        let store = store_from(&[(0, 1, 1.0)]);
        assert_eq!(slowest_equilibration_time(&store, &members(&[0])), 0.0);
    }

    #[test]
    fn tight_pair() {
        let store = store_from(&[(0, 1, 100.0), (1, 0, 100.0), (0, 2, 1.0)]);
        let t = slowest_equilibration_time(&store, &members(&[0, 1]));
        assert!((t - 0.01).abs() < 1e-12, "got {t}");
    }

    #[test]
    fn minimax_prefers_detour_over_slow_direct_edge() {
        // 0 → 2 directly at rate 0.1 (hop time 10), or 0 → 1 → 2 at rate 2
        // each (hop time 0.5).  The minimax cost 0 → 2 is 0.5, not 10.
        let store = store_from(&[
            (0, 2, 0.1),
            (0, 1, 2.0),
            (1, 2, 2.0),
            (2, 1, 2.0),
            (1, 0, 2.0),
        ]);
        let t = slowest_equilibration_time(&store, &members(&[0, 1, 2]));
        assert!((t - 0.5).abs() < 1e-12, "got {t}");
    }

    #[test]
    fn worst_pair_dominates() {
        // Chain 0 ↔ 1 ↔ 2 with a slow middle link: the 0→2 pair is bounded
        // by the slowest hop on its only path.
        let store = store_from(&[
            (0, 1, 10.0),
            (1, 0, 10.0),
            (1, 2, 0.5),
            (2, 1, 0.5),
        ]);
        let t = slowest_equilibration_time(&store, &members(&[0, 1, 2]));
        assert!((t - 2.0).abs() < 1e-12, "got {t}");
    }

    #[test]
    fn disconnected_pair_is_infinite() {
        // 0 → 1 only: the ordered pair (1, 0) is unreachable.
        let store = store_from(&[(0, 1, 1.0), (1, 2, 1.0)]);
        let t = slowest_equilibration_time(&store, &members(&[0, 1]));
        assert!(t.is_infinite());
    }

    #[test]
    fn edges_outside_member_set_are_ignored() {
        // A fast shortcut through non-member 9 must not help.
        let store = store_from(&[
            (0, 1, 0.25),
            (1, 0, 0.25),
            (0, 9, 1000.0),
            (9, 1, 1000.0),
        ]);
        let t = slowest_equilibration_time(&store, &members(&[0, 1]));
        assert!((t - 4.0).abs() < 1e-12, "got {t}");
    }
}
