//! The `Cluster` topology feature.
//!
//! A cluster stands in for a basin of tightly coupled sites.  Its interior
//! is assumed equilibrated, so the steady-state master equation
//!
//!   π[j] = Σ_i π[i] · P[i→j],   Σ π = 1
//!
//! over the member transition matrix gives the probability of finding the
//! walker on each interior site.  From π the cluster derives everything the
//! walker loop needs: an escape time constant, the distribution over exit
//! neighbors, and per-member hop-off probabilities.  One cluster macro-step
//! then replaces the many micro-hops a walker would spend oscillating inside
//! the basin.
//!
//! `P[i→j]` is normalized by the *full* outgoing rate of `i` (internal and
//! external channels), so interior probability leaks every iteration; the
//! fixed point renormalizes after each sweep and converges to the
//! quasi-stationary interior distribution.

use std::collections::{BTreeMap, BTreeSet};

use kmc_core::{ClusterId, FeatureRng, SiteId};
use kmc_graph::RateStore;

use crate::site::sample_cumulative;
use crate::{EngineError, EngineResult};

/// Default convergence tolerance of the master-equation fixed point.
pub const DEFAULT_CONVERGENCE_TOLERANCE: f64 = 0.001;

/// The coarsest allowed macro-step is half the escape time constant.
pub(crate) const MINIMUM_RESOLUTION: f64 = 2.0;

/// Fixed-point sweeps allowed before tolerance convergence is declared failed.
const MAX_SOLVE_SWEEPS: u64 = 100_000;

/// How the master-equation fixed point decides it is done.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Convergence {
    /// Sweep until the largest per-site probability change drops below the
    /// tolerance.
    Tolerance(f64),
    /// Run exactly this many sweeps.
    IterationsPerCluster(u32),
    /// Run this many sweeps per member site.
    IterationsPerSite(u32),
}

impl Default for Convergence {
    fn default() -> Self {
        Convergence::Tolerance(DEFAULT_CONVERGENCE_TOLERANCE)
    }
}

/// An aggregated topology feature covering a basin of member sites.
pub struct Cluster {
    id: ClusterId,
    members: BTreeSet<SiteId>,
    convergence: Convergence,
    /// Macro-steps per escape time; dwell samples scale with `τ/resolution`.
    resolution: f64,
    /// Expected time to leave the cluster from the interior steady state.
    /// `+∞` when no member has an external channel.
    escape_time_constant: f64,
    /// Interior steady-state occupation, keyed by member.
    occupation_prob: BTreeMap<SiteId, f64>,
    /// `(exit neighbor, cumulative probability)`, descending-probability
    /// order before accumulation.  Empty iff the cluster is absorbing.
    exit_cdf: Vec<(SiteId, f64)>,
    /// `(member, cumulative probability)` over π, for the interior pick.
    internal_cdf: Vec<(SiteId, f64)>,
    /// Probability that a hop from each member leaves the cluster.
    hop_off_prob: BTreeMap<SiteId, f64>,
    /// Per-member cumulative distribution over *internal* neighbors.
    internal_neighbor_cdf: BTreeMap<SiteId, Vec<(SiteId, f64)>>,
    /// Visits accounted to each member while the cluster answers for it.
    visit_frequency: BTreeMap<SiteId, u64>,
    rng: FeatureRng,
}

impl Cluster {
    pub fn new(id: ClusterId, rng: FeatureRng) -> Self {
        Self {
            id,
            members: BTreeSet::new(),
            convergence: Convergence::default(),
            resolution: MINIMUM_RESOLUTION,
            escape_time_constant: f64::INFINITY,
            occupation_prob: BTreeMap::new(),
            exit_cdf: Vec::new(),
            internal_cdf: Vec::new(),
            hop_off_prob: BTreeMap::new(),
            internal_neighbor_cdf: BTreeMap::new(),
            visit_frequency: BTreeMap::new(),
            rng,
        }
    }

    // ── Membership ────────────────────────────────────────────────────────

    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn members(&self) -> &BTreeSet<SiteId> {
        &self.members
    }

    pub fn contains(&self, site: SiteId) -> bool {
        self.members.contains(&site)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Extend the member set.  Call [`refresh`](Self::refresh) afterwards;
    /// the probability tables are stale until then.
    pub fn add_sites(&mut self, sites: &[SiteId]) {
        self.members.extend(sites.iter().copied());
    }

    /// Move every member of `other` into `self`, merging visit accounting.
    /// `other` is left empty and is expected to be erased by the caller.
    pub fn migrate_from(&mut self, other: &mut Cluster) {
        self.members.append(&mut other.members);
        for (site, visits) in std::mem::take(&mut other.visit_frequency) {
            *self.visit_frequency.entry(site).or_insert(0) += visits;
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────

    pub fn convergence(&self) -> Convergence {
        self.convergence
    }

    /// Set the convergence policy for subsequent [`refresh`](Self::refresh)
    /// calls.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a non-positive tolerance or a zero iteration
    /// count.
    pub fn set_convergence(&mut self, convergence: Convergence) -> EngineResult<()> {
        match convergence {
            Convergence::Tolerance(tol) if !(tol.is_finite() && tol > 0.0) => {
                return Err(EngineError::InvalidArgument(format!(
                    "convergence tolerance must be positive, got {tol}"
                )));
            }
            Convergence::IterationsPerCluster(0) | Convergence::IterationsPerSite(0) => {
                return Err(EngineError::InvalidArgument(
                    "convergence iteration count must be at least 1".into(),
                ));
            }
            _ => {}
        }
        self.convergence = convergence;
        Ok(())
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Set how finely the escape time is discretized.  Clamped below at 2:
    /// a coarser step than `τ/2` would skip the noise the simulation is
    /// supposed to resolve.
    pub fn set_resolution(&mut self, resolution: f64) {
        self.resolution = resolution.max(MINIMUM_RESOLUTION);
    }

    // ── Derived state ─────────────────────────────────────────────────────

    pub fn escape_time_constant(&self) -> f64 {
        self.escape_time_constant
    }

    /// The maximum dwell sample scale, `τ/resolution`.  `+∞` for an
    /// absorbing cluster.
    pub fn time_increment(&self) -> f64 {
        if self.escape_time_constant.is_finite() {
            self.escape_time_constant / self.resolution
        } else {
            f64::INFINITY
        }
    }

    /// `true` when no member has a channel out of the cluster.
    pub fn is_absorbing(&self) -> bool {
        self.escape_time_constant.is_infinite()
    }

    pub fn occupation_probability(&self, site: SiteId) -> Option<f64> {
        self.occupation_prob.get(&site).copied()
    }

    /// Cumulative exit distribution over non-member neighbors.
    pub fn exit_probabilities(&self) -> &[(SiteId, f64)] {
        &self.exit_cdf
    }

    pub fn hop_off_probability(&self, site: SiteId) -> Option<f64> {
        self.hop_off_prob.get(&site).copied()
    }

    /// Visits accounted to `site` while this cluster answered for it.
    pub fn visit_frequency(&self, site: SiteId) -> u64 {
        self.visit_frequency.get(&site).copied().unwrap_or(0)
    }

    // ── Master equation ───────────────────────────────────────────────────

    /// Re-solve the master equation and rebuild every derived table from the
    /// current rates.
    ///
    /// Must be called after membership changes and after any member's rates
    /// are overwritten in the store.
    ///
    /// # Errors
    ///
    /// `Internal` if the fixed point fails to converge within the sweep
    /// budget or the interior probabilities drift off normalization.
    pub fn refresh(&mut self, store: &RateStore) -> EngineResult<()> {
        if self.members.is_empty() {
            return Err(EngineError::Internal(format!(
                "{} has no members to solve over",
                self.id
            )));
        }

        // Per-member channel split against the current member set.
        let mut totals: BTreeMap<SiteId, f64> = BTreeMap::new();
        let mut internal: BTreeMap<SiteId, Vec<(SiteId, f64)>> = BTreeMap::new();
        let mut external: BTreeMap<SiteId, Vec<(SiteId, f64)>> = BTreeMap::new();
        for &member in &self.members {
            let mut inside = Vec::new();
            let mut outside = Vec::new();
            let mut total = 0.0;
            for (neighbor, rate) in store.outgoing(member) {
                total += rate;
                if self.members.contains(&neighbor) {
                    inside.push((neighbor, rate));
                } else {
                    outside.push((neighbor, rate));
                }
            }
            totals.insert(member, total);
            internal.insert(member, inside);
            external.insert(member, outside);
        }

        let occupation = self.solve_fixed_point(&totals, &internal)?;

        // Escape rate and per-exit-neighbor weights under π.
        let mut escape_rate = 0.0;
        let mut exit_weights: BTreeMap<SiteId, f64> = BTreeMap::new();
        for (&member, channels) in &external {
            let pi = occupation[&member];
            for &(neighbor, rate) in channels {
                escape_rate += pi * rate;
                *exit_weights.entry(neighbor).or_insert(0.0) += pi * rate;
            }
        }

        self.escape_time_constant = if escape_rate > 0.0 {
            1.0 / escape_rate
        } else {
            f64::INFINITY
        };
        self.exit_cdf = if escape_rate > 0.0 {
            descending_cdf(
                exit_weights
                    .into_iter()
                    .map(|(site, w)| (site, w / escape_rate))
                    .collect(),
            )
        } else {
            Vec::new()
        };

        self.internal_cdf =
            descending_cdf(occupation.iter().map(|(&s, &p)| (s, p)).collect());

        self.hop_off_prob = self
            .members
            .iter()
            .map(|&member| {
                let total = totals[&member];
                let off: f64 = external[&member].iter().map(|&(_, r)| r).sum();
                (member, if total > 0.0 { off / total } else { 0.0 })
            })
            .collect();

        self.internal_neighbor_cdf = internal
            .iter()
            .map(|(&member, channels)| {
                let weight: f64 = channels.iter().map(|&(_, r)| r).sum();
                let mut running = 0.0;
                let cdf = channels
                    .iter()
                    .map(|&(neighbor, rate)| {
                        running += rate / weight;
                        (neighbor, running)
                    })
                    .collect();
                (member, cdf)
            })
            .collect();

        for &member in &self.members {
            self.visit_frequency.entry(member).or_insert(0);
        }
        self.occupation_prob = occupation;
        Ok(())
    }

    /// Iterate `π ← normalize((π + π P) / 2)` from the uniform start until
    /// the configured stopping rule holds.
    ///
    /// The sweep averages in the current iterate: pure `π ← normalize(π P)`
    /// cycles forever on bipartite member graphs (any asymmetric two-site
    /// cluster), while the damped map shares its fixed point and always
    /// settles on the dominant eigenvector.
    fn solve_fixed_point(
        &self,
        totals: &BTreeMap<SiteId, f64>,
        internal: &BTreeMap<SiteId, Vec<(SiteId, f64)>>,
    ) -> EngineResult<BTreeMap<SiteId, f64>> {
        let n = self.members.len();
        let uniform = 1.0 / n as f64;
        let mut pi: BTreeMap<SiteId, f64> =
            self.members.iter().map(|&m| (m, uniform)).collect();

        let sweep_budget = match self.convergence {
            Convergence::Tolerance(_) => MAX_SOLVE_SWEEPS,
            Convergence::IterationsPerCluster(sweeps) => u64::from(sweeps),
            Convergence::IterationsPerSite(per_site) => u64::from(per_site) * n as u64,
        };

        for _ in 0..sweep_budget {
            let mut next: BTreeMap<SiteId, f64> =
                self.members.iter().map(|&m| (m, pi[&m])).collect();
            for (&member, channels) in internal {
                let total = totals[&member];
                if total <= 0.0 {
                    continue;
                }
                let weight = pi[&member] / total;
                for &(neighbor, rate) in channels {
                    *next.get_mut(&neighbor).ok_or_else(|| {
                        EngineError::Internal(format!(
                            "internal channel to non-member {neighbor}"
                        ))
                    })? += weight * rate;
                }
            }

            let mass: f64 = next.values().sum();
            for p in next.values_mut() {
                *p /= mass;
            }

            let delta = self
                .members
                .iter()
                .map(|m| (next[m] - pi[m]).abs())
                .fold(0.0, f64::max);
            pi = next;

            if let Convergence::Tolerance(tol) = self.convergence {
                if delta < tol {
                    check_normalized(&pi)?;
                    return Ok(pi);
                }
            }
        }

        if let Convergence::Tolerance(tol) = self.convergence {
            return Err(EngineError::Internal(format!(
                "master equation failed to reach tolerance {tol} within {MAX_SOLVE_SWEEPS} sweeps"
            )));
        }
        check_normalized(&pi)?;
        Ok(pi)
    }

    // ── Walker interface ──────────────────────────────────────────────────

    /// Sample a macro-step waiting time, `(τ/resolution) · (-ln u)`.
    ///
    /// Bounded well below the raw escape distribution so a simulation with
    /// horizon `time_resolution` observes several interior updates per
    /// measurement.  `+∞` for an absorbing cluster.
    pub fn dwell_time(&mut self) -> f64 {
        if self.is_absorbing() {
            return f64::INFINITY;
        }
        self.time_increment() * self.rng.exp_deviate()
    }

    /// Sample the walker's next site id.
    ///
    /// Two stages: pick the interior member the walker is effectively on
    /// (by π), then decide between escaping through an exit neighbor and
    /// hopping to one of that member's internal neighbors.  The chosen
    /// interior member is charged one visit.
    pub fn pick_new_site(&mut self) -> SiteId {
        let u = self.rng.uniform();
        let Some(member) = sample_cumulative(&self.internal_cdf, u) else {
            // Tables not yet solved; answer with the lowest member id.
            return self.members.iter().next().copied().unwrap_or(SiteId::UNASSIGNED);
        };
        *self.visit_frequency.entry(member).or_insert(0) += 1;

        let hop_off = self.hop_off_prob.get(&member).copied().unwrap_or(0.0);
        if self.rng.uniform() < hop_off {
            let u_exit = self.rng.uniform();
            sample_cumulative(&self.exit_cdf, u_exit).unwrap_or(member)
        } else {
            let u_internal = self.rng.uniform();
            self.internal_neighbor_cdf
                .get(&member)
                .and_then(|cdf| sample_cumulative(cdf, u_internal))
                .unwrap_or(member)
        }
    }
}

/// Build a cumulative distribution, highest probability first so the common
/// draw terminates early; ties break on ascending site id for run-to-run
/// stability.
fn descending_cdf(mut entries: Vec<(SiteId, f64)>) -> Vec<(SiteId, f64)> {
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let mut running = 0.0;
    for entry in &mut entries {
        running += entry.1;
        entry.1 = running;
    }
    entries
}

fn check_normalized(pi: &BTreeMap<SiteId, f64>) -> EngineResult<()> {
    let mass: f64 = pi.values().sum();
    if (mass - 1.0).abs() > 1e-6 {
        return Err(EngineError::Internal(format!(
            "interior occupation drifted off normalization: Σπ = {mass}"
        )));
    }
    Ok(())
}
