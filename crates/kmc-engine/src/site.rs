//! The `Site` topology feature.
//!
//! A site emits dwell times and next-site picks as if it were the only
//! feature covering itself: exponential waiting with the total outgoing rate,
//! and inverse-CDF neighbor selection proportional to each rate.
//!
//! The cumulative table is derived from the [`RateStore`] and rebuilt by the
//! engine whenever a rate is overwritten, so the store stays the single
//! owner of rate values.

use kmc_core::{ClusterId, FeatureRng, SiteId};
use kmc_graph::RateStore;

/// One lattice site.
pub struct Site {
    id: SiteId,
    cluster_id: ClusterId,
    visit_frequency: u64,
    occupied: bool,
    /// Sum of all outgoing rates.  Zero marks a drain.
    total_rate: f64,
    /// `(neighbor, cumulative probability)` in ascending neighbor-id order;
    /// the last cumulative is 1 for non-drains.
    cumulative: Vec<(SiteId, f64)>,
    rng: FeatureRng,
}

impl Site {
    /// Create a site with no outgoing rates (a drain until
    /// [`refresh_rates`](Self::refresh_rates) says otherwise).
    pub fn new(id: SiteId, rng: FeatureRng) -> Self {
        Self {
            id,
            cluster_id: ClusterId::UNASSIGNED,
            visit_frequency: 0,
            occupied: false,
            total_rate: 0.0,
            cumulative: Vec::new(),
            rng,
        }
    }

    /// Rebuild the cumulative neighbor table from the store.
    pub fn refresh_rates(&mut self, store: &RateStore) {
        self.total_rate = store.total_outgoing(self.id);
        self.cumulative.clear();
        if self.total_rate <= 0.0 {
            return;
        }
        let mut running = 0.0;
        for (neighbor, rate) in store.outgoing(self.id) {
            running += rate / self.total_rate;
            self.cumulative.push((neighbor, running));
        }
    }

    pub fn id(&self) -> SiteId {
        self.id
    }

    pub fn cluster_id(&self) -> ClusterId {
        self.cluster_id
    }

    pub fn set_cluster_id(&mut self, cluster: ClusterId) {
        self.cluster_id = cluster;
    }

    pub fn visit_frequency(&self) -> u64 {
        self.visit_frequency
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// A drain has no outgoing rates; a walker that reaches one never moves.
    pub fn is_drain(&self) -> bool {
        self.total_rate <= 0.0
    }

    pub fn total_rate(&self) -> f64 {
        self.total_rate
    }

    /// Occupy the site as a bare feature, counting the visit.
    pub fn occupy(&mut self) {
        self.occupied = true;
        self.visit_frequency += 1;
    }

    pub fn vacate(&mut self) {
        self.occupied = false;
    }

    /// Set occupancy without touching the visit counter.  Used when a
    /// cluster answers for this site and does its own visit accounting.
    pub fn set_occupied(&mut self, occupied: bool) {
        self.occupied = occupied;
    }

    /// Sample a waiting time: `-ln(u) / Σ rates`, `+∞` on a drain.
    pub fn dwell_time(&mut self) -> f64 {
        if self.is_drain() {
            return f64::INFINITY;
        }
        self.rng.exp_deviate() / self.total_rate
    }

    /// Sample the next site, each neighbor weighted by its rate.
    ///
    /// A drain returns its own id; the pick is never traversed because the
    /// matching dwell time is infinite.
    pub fn pick_new_site(&mut self) -> SiteId {
        if self.is_drain() {
            return self.id;
        }
        let u = self.rng.uniform();
        sample_cumulative(&self.cumulative, u).unwrap_or(self.id)
    }
}

/// First entry whose cumulative probability exceeds `u`; the last entry
/// backstops rounding at the top of the table.
pub(crate) fn sample_cumulative(table: &[(SiteId, f64)], u: f64) -> Option<SiteId> {
    table
        .iter()
        .find(|&&(_, cum)| u < cum)
        .or(table.last())
        .map(|&(site, _)| site)
}
