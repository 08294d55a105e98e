//! `RateStore` — the directed hop-rate table.
//!
//! # Design
//!
//! The store is the single owner of every rate value in the system.  Sites
//! and clusters hold only *derived* tables (cumulative distributions, escape
//! sums) that the engine refreshes after a `set_rate`, so reading through the
//! store always yields the latest value.
//!
//! Rates are keyed `(from, to)` and directional: `add_rate(a, b, r)` says
//! nothing about `b → a`.  A missing entry means no direct transition.
//!
//! `BTreeMap` rather than `HashMap` throughout: neighbor iteration order
//! feeds cumulative-distribution construction and RNG-visible tie-breaking,
//! so it must be identical across runs.

use std::collections::{BTreeMap, BTreeSet};

use kmc_core::SiteId;

use crate::{GraphError, GraphResult};

/// Append-mostly table of directed hop rates with derived neighbor views.
#[derive(Default, Debug, Clone)]
pub struct RateStore {
    /// `from → (to → rate)`.  Inner maps are never empty.
    rates: BTreeMap<SiteId, BTreeMap<SiteId, f64>>,
}

impl RateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directed rate.
    ///
    /// # Errors
    ///
    /// `DuplicateRate` if the pair was already added, `NonPositiveRate` if
    /// `rate` is not a positive finite number.
    pub fn add_rate(&mut self, from: SiteId, to: SiteId, rate: f64) -> GraphResult<()> {
        check_rate(from, to, rate)?;
        let neighbors = self.rates.entry(from).or_default();
        if neighbors.contains_key(&to) {
            return Err(GraphError::DuplicateRate { from, to });
        }
        neighbors.insert(to, rate);
        Ok(())
    }

    /// Bulk form of [`add_rate`](Self::add_rate); stops at the first error.
    pub fn add_rates(&mut self, rates: BTreeMap<SiteId, BTreeMap<SiteId, f64>>) -> GraphResult<()> {
        for (from, neighbors) in rates {
            for (to, rate) in neighbors {
                self.add_rate(from, to, rate)?;
            }
        }
        Ok(())
    }

    /// Overwrite an *existing* rate in place.
    ///
    /// Cluster probability tables derived from the old value are stale after
    /// this call; the engine re-solves affected clusters via
    /// `update_cluster`.
    pub fn set_rate(&mut self, from: SiteId, to: SiteId, rate: f64) -> GraphResult<()> {
        check_rate(from, to, rate)?;
        let slot = self
            .rates
            .get_mut(&from)
            .and_then(|n| n.get_mut(&to))
            .ok_or(GraphError::RateNotFound { from, to })?;
        *slot = rate;
        Ok(())
    }

    /// The rate `from → to`, if one was added.
    pub fn rate(&self, from: SiteId, to: SiteId) -> Option<f64> {
        self.rates.get(&from).and_then(|n| n.get(&to)).copied()
    }

    /// Like [`rate`](Self::rate) but an error on a missing pair.
    pub fn get_rate(&self, from: SiteId, to: SiteId) -> GraphResult<f64> {
        self.rate(from, to).ok_or(GraphError::RateNotFound { from, to })
    }

    // ── Neighbor views ────────────────────────────────────────────────────

    /// Outgoing `(neighbor, rate)` pairs of `site`, in ascending neighbor-id
    /// order.  Empty for drains and unknown sites.
    pub fn outgoing(&self, site: SiteId) -> impl Iterator<Item = (SiteId, f64)> + '_ {
        self.rates
            .get(&site)
            .into_iter()
            .flat_map(|n| n.iter().map(|(&to, &rate)| (to, rate)))
    }

    /// Incoming `(neighbor, rate)` pairs of `site`, in ascending neighbor-id
    /// order.  O(edges): incoming edges are not indexed.
    pub fn incoming(&self, site: SiteId) -> Vec<(SiteId, f64)> {
        self.rates
            .iter()
            .filter_map(|(&from, neighbors)| neighbors.get(&site).map(|&r| (from, r)))
            .collect()
    }

    pub fn outgoing_count(&self, site: SiteId) -> usize {
        self.rates.get(&site).map_or(0, BTreeMap::len)
    }

    pub fn incoming_count(&self, site: SiteId) -> usize {
        self.rates.values().filter(|n| n.contains_key(&site)).count()
    }

    /// Sum of all outgoing rates of `site`.  Zero for drains.
    pub fn total_outgoing(&self, site: SiteId) -> f64 {
        self.outgoing(site).map(|(_, r)| r).sum()
    }

    /// The largest outgoing rate of `site`, or `None` for drains.
    pub fn max_outgoing(&self, site: SiteId) -> Option<f64> {
        self.outgoing(site).map(|(_, r)| r).reduce(f64::max)
    }

    /// A drain has no outgoing rates: a walker that reaches one never moves.
    pub fn is_drain(&self, site: SiteId) -> bool {
        self.outgoing_count(site) == 0
    }

    // ── Site classification ───────────────────────────────────────────────

    /// Every site id appearing on either end of a rate, ascending.
    pub fn all_site_ids(&self) -> BTreeSet<SiteId> {
        let mut ids: BTreeSet<SiteId> = self.rates.keys().copied().collect();
        for neighbors in self.rates.values() {
            ids.extend(neighbors.keys().copied());
        }
        ids
    }

    /// Sites that appear only as destinations (no outgoing rates), ascending.
    pub fn drain_site_ids(&self) -> BTreeSet<SiteId> {
        self.all_site_ids()
            .into_iter()
            .filter(|&id| self.is_drain(id))
            .collect()
    }

    /// Sites with outgoing rates but no incoming ones, ascending.
    pub fn sources(&self) -> Vec<SiteId> {
        let with_incoming = self.ids_with_incoming();
        self.rates
            .keys()
            .copied()
            .filter(|id| !with_incoming.contains(id))
            .collect()
    }

    /// Sites with incoming rates but no outgoing ones, ascending.
    pub fn sinks(&self) -> Vec<SiteId> {
        self.ids_with_incoming()
            .into_iter()
            .filter(|&id| !self.rates.contains_key(&id))
            .collect()
    }

    /// Total number of directed rates stored.
    pub fn len(&self) -> usize {
        self.rates.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    fn ids_with_incoming(&self) -> BTreeSet<SiteId> {
        self.rates
            .values()
            .flat_map(|n| n.keys().copied())
            .collect()
    }
}

fn check_rate(from: SiteId, to: SiteId, rate: f64) -> GraphResult<()> {
    if !(rate.is_finite() && rate > 0.0) {
        return Err(GraphError::NonPositiveRate { from, to, rate });
    }
    Ok(())
}
