//! Bottleneck-path search over a restricted site set.
//!
//! # What is being computed
//!
//! A candidate basin equilibrates internally at the pace of its slowest
//! unavoidable hop.  With edge weight `1/rate` (the expected time of one
//! hop), the equilibration time between two member sites is the *minimax*
//! path cost: over all connecting paths inside the member set, the one whose
//! slowest hop is fastest.  The basin's **internal time limit** is the
//! maximum of that cost over every ordered member pair — the worst pair
//! bounds how long the basin needs to reach its interior steady state.
//!
//! # Determinism
//!
//! The heap is keyed `(cost, site_id)` so equal-cost pops resolve in
//! ascending id order, identically across runs.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use kmc_core::SiteId;

use crate::RateStore;

/// Total-ordered wrapper so `f64` hop times can live in a `BinaryHeap`.
///
/// NaN never occurs here (weights are `1/rate` of positive finite rates),
/// so `total_cmp` ordering is just the numeric order.
#[derive(Copy, Clone, PartialEq)]
struct HopTime(f64);

impl Eq for HopTime {}

impl PartialOrd for HopTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HopTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Worst-pair internal equilibration time of `members`.
///
/// Runs one bottleneck Dijkstra per member over the subgraph induced by
/// `members` and returns the maximum pairwise minimax cost.  Returns `0.0`
/// for fewer than two members and `+∞` as soon as any ordered pair is
/// unreachable — a basin that is not strongly connected can never be treated
/// as equilibrated.
pub fn slowest_equilibration_time(store: &RateStore, members: &BTreeSet<SiteId>) -> f64 {
    if members.len() < 2 {
        return 0.0;
    }

    let mut worst = 0.0_f64;
    for &source in members {
        let reached = bottleneck_times_from(store, members, source);
        if reached.len() < members.len() {
            return f64::INFINITY;
        }
        for (&site, &time) in &reached {
            if site != source && time > worst {
                worst = time;
            }
        }
    }
    worst
}

/// Minimax hop time from `source` to every reachable member.
///
/// Dijkstra with the relaxation `candidate = max(cost_so_far, 1/rate)`: the
/// cost of a path is its slowest hop, and the algorithm minimizes that over
/// paths.
fn bottleneck_times_from(
    store: &RateStore,
    members: &BTreeSet<SiteId>,
    source: SiteId,
) -> BTreeMap<SiteId, f64> {
    let mut best: BTreeMap<SiteId, f64> = BTreeMap::new();
    best.insert(source, 0.0);

    // Min-heap: (bottleneck time, site). Reverse makes BinaryHeap (max)
    // behave as min-heap.
    let mut heap: BinaryHeap<Reverse<(HopTime, SiteId)>> = BinaryHeap::new();
    heap.push(Reverse((HopTime(0.0), source)));

    while let Some(Reverse((HopTime(cost), site))) = heap.pop() {
        // Skip stale heap entries.
        if best.get(&site).is_some_and(|&b| cost > b) {
            continue;
        }

        for (neighbor, rate) in store.outgoing(site) {
            if !members.contains(&neighbor) {
                continue;
            }
            let candidate = cost.max(1.0 / rate);
            if best.get(&neighbor).is_none_or(|&b| candidate < b) {
                best.insert(neighbor, candidate);
                heap.push(Reverse((HopTime(candidate), neighbor)));
            }
        }
    }
    best
}
