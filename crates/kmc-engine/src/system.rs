//! The `CoarseGrainSystem` — walker scheduling plus adaptive coarse-graining.
//!
//! # Hop loop
//!
//! Each [`hop`](CoarseGrainSystem::hop) call advances one walker:
//!
//! 1. Look up the features answering for the walker's current site and its
//!    pre-sampled destination.
//! 2. If the destination is free, move there; otherwise the hop is blocked
//!    and the walker stays, refreshing its pending move either way.
//! 3. Bump the global iteration counter.  Once it exceeds the adaptive
//!    threshold, run the coarse grainer on the attempted destination:
//!    explore the basin, test it for interior equilibrium, and create, grow,
//!    or merge a cluster.  Success resets the threshold to its minimum;
//!    failure doubles it so unpromising topology stops being re-examined.
//!
//! Everything is synchronous and single-threaded; callers wanting ensemble
//! parallelism run independent systems with their own seeds.

use std::collections::{BTreeMap, BTreeSet};

use kmc_core::{ClusterId, FeatureRng, SiteId, WalkerId};
use kmc_graph::{slowest_equilibration_time, RateStore};

use crate::basin::BasinExplorer;
use crate::cluster::{Cluster, Convergence, DEFAULT_CONVERGENCE_TOLERANCE, MINIMUM_RESOLUTION};
use crate::feature::{Dispatch, Feature};
use crate::site::Site;
use crate::walker::Walker;
use crate::{EngineError, EngineResult};

/// Sentinel for [`set_min_coarse_grain_iteration_threshold`]
/// [CoarseGrainSystem::set_min_coarse_grain_iteration_threshold]: never
/// coarse grain.
pub const ITERATIONS_UNLIMITED: u64 = u64::MAX;

const DEFAULT_ITERATION_THRESHOLD: u64 = 1000;

/// The engine: site/cluster containers, the dispatch table, and the global
/// hop counter driving coarse-graining cadence.
pub struct CoarseGrainSystem {
    performance_ratio: f64,
    minimum_resolution: f64,
    time_resolution: Option<f64>,
    /// Next seed handed to a newly created feature RNG.
    next_seed: u64,
    iteration: u64,
    iteration_threshold: u64,
    iteration_threshold_min: u64,
    rates: RateStore,
    sites: BTreeMap<SiteId, Site>,
    clusters: BTreeMap<ClusterId, Cluster>,
    next_cluster_id: u32,
    dispatch: Dispatch,
}

impl Default for CoarseGrainSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl CoarseGrainSystem {
    pub fn new() -> Self {
        Self {
            performance_ratio: 1.0,
            minimum_resolution: MINIMUM_RESOLUTION,
            time_resolution: None,
            next_seed: 0,
            iteration: 0,
            iteration_threshold: DEFAULT_ITERATION_THRESHOLD,
            iteration_threshold_min: DEFAULT_ITERATION_THRESHOLD,
            rates: RateStore::new(),
            sites: BTreeMap::new(),
            clusters: BTreeMap::new(),
            next_cluster_id: 0,
            dispatch: Dispatch::new(),
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────

    /// Seed the deterministic RNG handout.  Every site and cluster receives
    /// the next counter value as it is created, so the seed must be fixed
    /// before any feature exists.
    ///
    /// # Errors
    ///
    /// `SeedAfterInitialize` once `initialize_system` has run.
    pub fn set_random_seed(&mut self, seed: u64) -> EngineResult<()> {
        if !self.sites.is_empty() {
            return Err(EngineError::SeedAfterInitialize);
        }
        self.next_seed = seed;
        Ok(())
    }

    /// Set the measurement horizon.  A cluster must be able to update at
    /// least once per `time_resolution` of simulated time, or the
    /// coarse-grained noise would drop out of the data.
    pub fn set_time_resolution(&mut self, time_resolution: f64) -> EngineResult<()> {
        if !(time_resolution.is_finite() && time_resolution > 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "time resolution must be a positive value, got {time_resolution}"
            )));
        }
        self.time_resolution = Some(time_resolution);
        Ok(())
    }

    /// The configured measurement horizon.
    ///
    /// # Errors
    ///
    /// `NotInitialized` if `set_time_resolution` has not been called.
    pub fn time_resolution(&self) -> EngineResult<f64> {
        self.time_resolution
            .ok_or(EngineError::NotInitialized("time_resolution"))
    }

    /// Hops between coarse-graining attempts.  Pass [`ITERATIONS_UNLIMITED`]
    /// to disable coarse-graining entirely; the engine then reduces to naive
    /// KMC.
    pub fn set_min_coarse_grain_iteration_threshold(&mut self, threshold_min: u64) {
        self.iteration_threshold_min = threshold_min;
        self.iteration_threshold = threshold_min;
    }

    /// The current (possibly backed-off) coarse-graining threshold.
    pub fn coarse_grain_threshold(&self) -> u64 {
        self.iteration_threshold
    }

    /// How much faster a basin's interior must be than its escape channels
    /// before collapsing it pays off.
    pub fn set_performance_ratio(&mut self, ratio: f64) -> EngineResult<()> {
        if !(ratio.is_finite() && ratio >= 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "performance ratio must be non-negative, got {ratio}"
            )));
        }
        self.performance_ratio = ratio;
        Ok(())
    }

    /// Lower bound on cluster resolution used by the equilibrium test.
    pub fn set_minimum_coarse_graining_resolution(&mut self, resolution: f64) -> EngineResult<()> {
        if !(resolution.is_finite() && resolution >= MINIMUM_RESOLUTION) {
            return Err(EngineError::InvalidArgument(format!(
                "minimum coarse-graining resolution must be at least {MINIMUM_RESOLUTION}, got {resolution}"
            )));
        }
        self.minimum_resolution = resolution;
        Ok(())
    }

    // ── System setup ──────────────────────────────────────────────────────

    /// Register every site and its outgoing rates.
    ///
    /// Sites that appear only as destinations are auto-registered as drains
    /// so the dispatch covers every id a walker can reach.
    ///
    /// # Errors
    ///
    /// `NotInitialized` if the time resolution is unset; `Graph` on
    /// duplicate or non-positive rates.
    pub fn initialize_system(
        &mut self,
        rates: BTreeMap<SiteId, BTreeMap<SiteId, f64>>,
    ) -> EngineResult<()> {
        self.time_resolution()
            .map_err(|_| EngineError::NotInitialized("initialize_system"))?;
        self.rates.add_rates(rates)?;

        for id in self.rates.all_site_ids() {
            let rng = self.next_feature_rng();
            let mut site = Site::new(id, rng);
            site.refresh_rates(&self.rates);
            self.sites.insert(id, site);
            self.dispatch.register_site(id);
        }
        log::debug!(
            "initialized system: {} sites, {} rates, {} drains",
            self.sites.len(),
            self.rates.len(),
            self.rates.drain_site_ids().len()
        );
        Ok(())
    }

    /// Place walkers and pre-sample their first moves.
    ///
    /// # Errors
    ///
    /// `NotInitialized` before `initialize_system`; `WalkerUnplaced` for a
    /// walker without a current site; `UnknownSite` for one placed off the
    /// registered topology.
    pub fn initialize_walkers(
        &mut self,
        walkers: &mut [(WalkerId, Walker)],
    ) -> EngineResult<()> {
        if self.sites.is_empty() {
            return Err(EngineError::NotInitialized("initialize_walkers"));
        }
        for (walker_id, walker) in walkers {
            let site = walker
                .current_site()
                .ok_or(EngineError::WalkerUnplaced(*walker_id))?;
            self.occupy(site)?;
            let (dwell, potential) = self.sample_move(site)?;
            walker.set_dwell_time(dwell);
            walker.set_potential_site(potential);
        }
        Ok(())
    }

    /// Vacate the walker's current site and forget about it.
    pub fn remove_walker(&mut self, walker_id: WalkerId, walker: &Walker) -> EngineResult<()> {
        let site = walker
            .current_site()
            .ok_or(EngineError::WalkerUnplaced(walker_id))?;
        self.vacate(site)
    }

    // ── The hop loop ──────────────────────────────────────────────────────

    /// Advance one walker by one attempted hop.
    ///
    /// A blocked hop (destination occupied) leaves the walker in place but
    /// still refreshes its dwell time and pending destination.  Either way
    /// the iteration counter advances and may trigger coarse-graining on the
    /// attempted destination.
    pub fn hop(&mut self, walker_id: WalkerId, walker: &mut Walker) -> EngineResult<()> {
        let current = walker
            .current_site()
            .ok_or(EngineError::WalkerUnplaced(walker_id))?;
        let destination = walker
            .potential_site()
            .ok_or(EngineError::WalkerUnplaced(walker_id))?;

        if self.site(destination)?.is_occupied() {
            // Blocked: stay put, refresh the pending move.
            self.vacate(current)?;
            self.occupy(current)?;
            let (dwell, potential) = self.sample_move(current)?;
            walker.set_dwell_time(dwell);
            walker.set_potential_site(potential);
        } else {
            self.vacate(current)?;
            self.occupy(destination)?;
            walker.occupy_site(destination);
            let (dwell, potential) = self.sample_move(destination)?;
            walker.set_dwell_time(dwell);
            walker.set_potential_site(potential);
        }

        self.iteration += 1;
        if self.iteration > self.iteration_threshold {
            if self.iteration_threshold_min != ITERATIONS_UNLIMITED {
                if self.coarse_grain(destination)? {
                    self.iteration_threshold = self.iteration_threshold_min;
                } else {
                    self.iteration_threshold = self.iteration_threshold.saturating_mul(2);
                }
            }
            self.iteration = 0;
        }
        Ok(())
    }

    // ── Rate mutation ─────────────────────────────────────────────────────

    /// Overwrite an existing rate in place and refresh the source site's
    /// sampling table.  Clusters containing either endpoint are stale until
    /// [`update_cluster`](Self::update_cluster) re-solves them.
    pub fn update_rate(&mut self, from: SiteId, to: SiteId, rate: f64) -> EngineResult<()> {
        self.rates.set_rate(from, to, rate)?;
        let site = self
            .sites
            .get_mut(&from)
            .ok_or(EngineError::UnknownSite(from))?;
        site.refresh_rates(&self.rates);
        Ok(())
    }

    /// Re-solve a cluster's master equation against the current rates.
    pub fn update_cluster(&mut self, cluster_id: ClusterId) -> EngineResult<()> {
        let cluster = self
            .clusters
            .get_mut(&cluster_id)
            .ok_or(EngineError::UnknownCluster(cluster_id))?;
        cluster.refresh(&self.rates)
    }

    // ── Introspection ─────────────────────────────────────────────────────

    /// Total visits of `site`: those counted while it answered for itself
    /// plus those its cluster accounted to it.
    pub fn get_visit_frequency(&self, site: SiteId) -> EngineResult<u64> {
        let site_ref = self.site(site)?;
        let mut visits = site_ref.visit_frequency();
        if site_ref.cluster_id().is_assigned() {
            let cluster = self.cluster(site_ref.cluster_id())?;
            visits += cluster.visit_frequency(site);
        }
        Ok(visits)
    }

    /// The cluster owning `site`, or `ClusterId::UNASSIGNED`.
    pub fn get_cluster_id_of_site(&self, site: SiteId) -> EngineResult<ClusterId> {
        Ok(self.site(site)?.cluster_id())
    }

    /// Live clusters and their member lists.
    pub fn get_clusters(&self) -> BTreeMap<ClusterId, Vec<SiteId>> {
        self.clusters
            .iter()
            .map(|(&id, cluster)| (id, cluster.members().iter().copied().collect()))
            .collect()
    }

    pub fn get_resolution_of_clusters(&self) -> BTreeMap<ClusterId, f64> {
        self.clusters
            .iter()
            .map(|(&id, cluster)| (id, cluster.resolution()))
            .collect()
    }

    /// Per-cluster macro-step scale `τ/resolution`.
    pub fn get_time_increment_of_clusters(&self) -> BTreeMap<ClusterId, f64> {
        self.clusters
            .iter()
            .map(|(&id, cluster)| (id, cluster.time_increment()))
            .collect()
    }

    /// Sites with outgoing but no incoming rates.
    pub fn sources(&self) -> Vec<SiteId> {
        self.rates.sources()
    }

    /// Sites with incoming but no outgoing rates.
    pub fn sinks(&self) -> Vec<SiteId> {
        self.rates.sinks()
    }

    // ── Coarse graining ───────────────────────────────────────────────────

    /// Try to coarse grain around `seed`.  Returns whether the cluster set
    /// changed.
    pub(crate) fn coarse_grain(&mut self, seed: SiteId) -> EngineResult<bool> {
        let explorer = BasinExplorer::new(self.performance_ratio);
        let basin = explorer.find_basin(&self.rates, &self.sites, &self.clusters, seed);
        if basin.len() < 2 {
            return Ok(false);
        }

        let members: BTreeSet<SiteId> = basin.iter().copied().collect();
        let internal_time_limit = slowest_equilibration_time(&self.rates, &members);
        if !self.satisfies_equilibrium_condition(&members, internal_time_limit)? {
            return Ok(false);
        }

        let mut assignments: BTreeMap<SiteId, ClusterId> = BTreeMap::new();
        for &site in &basin {
            assignments.insert(site, self.site(site)?.cluster_id());
        }
        let distinct: BTreeSet<ClusterId> = assignments.values().copied().collect();

        if distinct.iter().all(|id| !id.is_assigned()) {
            self.create_cluster(&basin, internal_time_limit)?;
            Ok(true)
        } else if distinct.len() > 1 {
            let favored = distinct
                .iter()
                .copied()
                .filter(|id| id.is_assigned())
                .min()
                .ok_or_else(|| {
                    EngineError::Internal("merge branch reached with no live cluster".into())
                })?;
            self.merge_sites_and_clusters(&assignments, favored, internal_time_limit)?;
            Ok(true)
        } else {
            // The basin is exactly an existing cluster: nothing to do.
            Ok(false)
        }
    }

    /// A basin is worth collapsing when escaping it takes longer than
    /// traversing it at the minimum resolution, and a traversal still fits
    /// inside one measurement interval.
    fn satisfies_equilibrium_condition(
        &self,
        members: &BTreeSet<SiteId>,
        internal_time_limit: f64,
    ) -> EngineResult<bool> {
        let time_resolution = self.time_resolution()?;
        let external = self.external_time_constant(members);
        let traverse_time = internal_time_limit * self.minimum_resolution;
        Ok(external > traverse_time * self.performance_ratio && traverse_time < time_resolution)
    }

    /// Time constant of leaving the candidate set, `1/Σ rates off`.  Zero —
    /// which fails the equilibrium test — when there is no way out.
    fn external_time_constant(&self, members: &BTreeSet<SiteId>) -> f64 {
        let sum: f64 = members
            .iter()
            .flat_map(|&m| self.rates.outgoing(m))
            .filter(|(neighbor, _)| !members.contains(neighbor))
            .map(|(_, rate)| rate)
            .sum();
        if sum == 0.0 {
            0.0
        } else {
            1.0 / sum
        }
    }

    fn create_cluster(&mut self, members: &[SiteId], internal_time_limit: f64) -> EngineResult<ClusterId> {
        let time_resolution = self.time_resolution()?;
        let id = ClusterId(self.next_cluster_id);
        self.next_cluster_id += 1;

        let rng = self.next_feature_rng();
        let mut cluster = Cluster::new(id, rng);
        cluster.set_convergence(Convergence::Tolerance(DEFAULT_CONVERGENCE_TOLERANCE))?;
        cluster.add_sites(members);
        cluster.refresh(&self.rates)?;
        cluster.set_resolution(chosen_resolution(
            cluster.escape_time_constant(),
            internal_time_limit,
            time_resolution,
        ));

        for &site in members {
            let site_ref = self
                .sites
                .get_mut(&site)
                .ok_or(EngineError::UnknownSite(site))?;
            site_ref.set_cluster_id(id);
            self.dispatch.bind_cluster(site, id);
        }
        log::debug!(
            "created {} over {} sites (resolution {:.2})",
            id,
            members.len(),
            cluster.resolution()
        );
        self.clusters.insert(id, cluster);
        Ok(id)
    }

    /// Rebind every non-favored candidate onto `favored`, migrating whole
    /// clusters and absorbing free sites, then re-solve.
    fn merge_sites_and_clusters(
        &mut self,
        assignments: &BTreeMap<SiteId, ClusterId>,
        favored: ClusterId,
        internal_time_limit: f64,
    ) -> EngineResult<()> {
        let time_resolution = self.time_resolution()?;
        let mut free_sites: Vec<SiteId> = Vec::new();
        let mut absorbed: BTreeSet<ClusterId> = BTreeSet::new();

        for (&site, &cluster_id) in assignments {
            if cluster_id == favored {
                continue;
            }
            if cluster_id.is_assigned() {
                absorbed.insert(cluster_id);
            } else {
                free_sites.push(site);
            }
            let site_ref = self
                .sites
                .get_mut(&site)
                .ok_or(EngineError::UnknownSite(site))?;
            site_ref.set_cluster_id(favored);
            self.dispatch.bind_cluster(site, favored);
        }

        let mut donors: Vec<Cluster> = Vec::with_capacity(absorbed.len());
        for cluster_id in &absorbed {
            donors.push(
                self.clusters
                    .remove(cluster_id)
                    .ok_or(EngineError::UnknownCluster(*cluster_id))?,
            );
        }

        let cluster = self
            .clusters
            .get_mut(&favored)
            .ok_or(EngineError::UnknownCluster(favored))?;
        for donor in &mut donors {
            cluster.migrate_from(donor);
        }
        cluster.add_sites(&free_sites);
        cluster.refresh(&self.rates)?;
        cluster.set_resolution(chosen_resolution(
            cluster.escape_time_constant(),
            internal_time_limit,
            time_resolution,
        ));

        log::debug!(
            "merged {} cluster(s) and {} free site(s) into {}",
            absorbed.len(),
            free_sites.len(),
            favored
        );
        Ok(())
    }

    // ── Feature plumbing ──────────────────────────────────────────────────

    fn next_feature_rng(&mut self) -> FeatureRng {
        let rng = FeatureRng::new(self.next_seed);
        self.next_seed += 1;
        rng
    }

    fn feature_of(&self, site: SiteId) -> EngineResult<Feature> {
        self.dispatch
            .feature_of(site)
            .ok_or(EngineError::UnknownSite(site))
    }

    /// Occupy `site` through the feature answering for it.  A bare site
    /// counts the visit itself; a clustered site is only flagged, because
    /// the cluster charges visits to interior members as it samples them.
    fn occupy(&mut self, site: SiteId) -> EngineResult<()> {
        let feature = self.feature_of(site)?;
        let site_ref = self
            .sites
            .get_mut(&site)
            .ok_or(EngineError::UnknownSite(site))?;
        match feature {
            Feature::Site(_) => site_ref.occupy(),
            Feature::Cluster(_) => site_ref.set_occupied(true),
        }
        Ok(())
    }

    fn vacate(&mut self, site: SiteId) -> EngineResult<()> {
        self.sites
            .get_mut(&site)
            .ok_or(EngineError::UnknownSite(site))?
            .vacate();
        Ok(())
    }

    /// Sample `(dwell time, next site)` from the feature answering for
    /// `site`.
    fn sample_move(&mut self, site: SiteId) -> EngineResult<(f64, SiteId)> {
        match self.feature_of(site)? {
            Feature::Site(id) => {
                let site_ref = self
                    .sites
                    .get_mut(&id)
                    .ok_or(EngineError::UnknownSite(id))?;
                Ok((site_ref.dwell_time(), site_ref.pick_new_site()))
            }
            Feature::Cluster(cluster_id) => {
                let cluster = self
                    .clusters
                    .get_mut(&cluster_id)
                    .ok_or(EngineError::UnknownCluster(cluster_id))?;
                Ok((cluster.dwell_time(), cluster.pick_new_site()))
            }
        }
    }

    pub(crate) fn site(&self, id: SiteId) -> EngineResult<&Site> {
        self.sites.get(&id).ok_or(EngineError::UnknownSite(id))
    }

    pub(crate) fn cluster(&self, id: ClusterId) -> EngineResult<&Cluster> {
        self.clusters.get(&id).ok_or(EngineError::UnknownCluster(id))
    }
}

/// Resolution at creation: half the escape time per internal traversal, but
/// never so coarse that a measurement interval passes without an update, and
/// never below the floor of 2.
fn chosen_resolution(tau: f64, internal_time_limit: f64, time_resolution: f64) -> f64 {
    if !tau.is_finite() {
        return MINIMUM_RESOLUTION;
    }
    let halved = tau / (2.0 * internal_time_limit);
    let allowed = tau / time_resolution;
    halved.min(allowed).max(MINIMUM_RESOLUTION)
}
