//! Basin discovery: which sites around a seed form a low-resistance trap?
//!
//! # Admission rule
//!
//! Starting from the seed, the explorer keeps a member set and repeatedly
//! absorbs the most strongly coupled outside neighbor.  A free neighbor is
//! admitted only if the best channel from the members into it is at least
//! `performance_ratio × r_max`, where `r_max` is the largest outgoing rate
//! of any current member — the basin's dominant hop.  Exploration stops when
//! the strongest remaining channel falls below that bar, leaving a connected
//! region whose internal hops dominate every channel that was declined.
//!
//! # Merger detection
//!
//! The seed's own cluster is always part of the candidate set, and a
//! *clustered* neighbor of the seed joins wholesale — membership is
//! all-or-nothing, so an adjacent cluster either stays out or contributes
//! every member.  The same wholesale rule applies to a clustered site that
//! passes the channel test during expansion.  Whether the combined candidate
//! set actually becomes one cluster is not decided here; the equilibrium
//! test is the arbiter.
//!
//! Drain sites are never admitted: a basin is a region a walker oscillates
//! in, and nothing oscillates out of a drain.

use std::collections::{BTreeMap, BTreeSet};

use kmc_core::{ClusterId, SiteId};
use kmc_graph::RateStore;

use crate::cluster::Cluster;
use crate::site::Site;

/// Greedy rate-threshold basin search.
pub struct BasinExplorer {
    performance_ratio: f64,
}

impl BasinExplorer {
    pub fn new(performance_ratio: f64) -> Self {
        Self { performance_ratio }
    }

    /// Candidate basin around `seed`, as a sorted site list including `seed`.
    ///
    /// Returns `[seed]` alone when the seed is a drain or no neighbor
    /// qualifies.
    pub fn find_basin(
        &self,
        store: &RateStore,
        sites: &BTreeMap<SiteId, Site>,
        clusters: &BTreeMap<ClusterId, Cluster>,
        seed: SiteId,
    ) -> Vec<SiteId> {
        let mut members: BTreeSet<SiteId> = BTreeSet::new();
        absorb(&mut members, seed, sites, clusters);

        if store.is_drain(seed) {
            return members.into_iter().collect();
        }

        // Clustered neighbors of the seed join wholesale.
        let clustered_neighbors: Vec<SiteId> = store
            .outgoing(seed)
            .map(|(neighbor, _)| neighbor)
            .filter(|&n| !members.contains(&n) && is_clustered(n, sites))
            .collect();
        for neighbor in clustered_neighbors {
            absorb(&mut members, neighbor, sites, clusters);
        }

        loop {
            let r_max = members
                .iter()
                .filter_map(|&m| store.max_outgoing(m))
                .fold(0.0, f64::max);

            // Strongest channel out of the member set, skipping drains.
            // Ties resolve to the lower site id.
            let mut best: Option<(f64, SiteId)> = None;
            for &member in &members {
                for (neighbor, rate) in store.outgoing(member) {
                    if members.contains(&neighbor) || store.is_drain(neighbor) {
                        continue;
                    }
                    let better = match best {
                        None => true,
                        Some((best_rate, best_site)) => {
                            rate > best_rate || (rate == best_rate && neighbor < best_site)
                        }
                    };
                    if better {
                        best = Some((rate, neighbor));
                    }
                }
            }

            match best {
                Some((rate, neighbor)) if rate >= self.performance_ratio * r_max => {
                    absorb(&mut members, neighbor, sites, clusters);
                }
                _ => break,
            }
        }

        members.into_iter().collect()
    }
}

/// Add `site` — and, if it belongs to a cluster, every member of that
/// cluster — to the candidate set.
fn absorb(
    members: &mut BTreeSet<SiteId>,
    site: SiteId,
    sites: &BTreeMap<SiteId, Site>,
    clusters: &BTreeMap<ClusterId, Cluster>,
) {
    members.insert(site);
    let Some(cluster_id) = sites.get(&site).map(Site::cluster_id) else {
        return;
    };
    if cluster_id.is_assigned() {
        if let Some(cluster) = clusters.get(&cluster_id) {
            members.extend(cluster.members().iter().copied());
        }
    }
}

fn is_clustered(site: SiteId, sites: &BTreeMap<SiteId, Site>) -> bool {
    sites
        .get(&site)
        .is_some_and(|s| s.cluster_id().is_assigned())
}
