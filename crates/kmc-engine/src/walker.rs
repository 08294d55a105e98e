//! The `Walker` — a charge carrier hopping between topology features.
//!
//! A walker carries only its position and its pre-sampled next move.  All
//! randomness lives in the topology features; the walker is plain data the
//! caller owns and threads through [`CoarseGrainSystem::hop`]
//! [crate::CoarseGrainSystem::hop].

use kmc_core::SiteId;

/// A random walker.  Place it with [`occupy_site`](Self::occupy_site) before
/// handing it to the engine.
#[derive(Debug, Clone)]
pub struct Walker {
    current_site: SiteId,
    potential_site: SiteId,
    dwell_time: f64,
}

impl Walker {
    /// An unplaced walker.  The engine rejects it until `occupy_site` is
    /// called.
    pub fn new() -> Self {
        Self {
            current_site: SiteId::UNASSIGNED,
            potential_site: SiteId::UNASSIGNED,
            dwell_time: -1.0,
        }
    }

    /// A walker already placed on `site`.
    pub fn on_site(site: SiteId) -> Self {
        let mut walker = Self::new();
        walker.occupy_site(site);
        walker
    }

    /// Move the walker onto `site`.
    pub fn occupy_site(&mut self, site: SiteId) {
        self.current_site = site;
    }

    /// The site currently occupied, or `None` before placement.
    pub fn current_site(&self) -> Option<SiteId> {
        self.current_site.is_assigned().then_some(self.current_site)
    }

    /// The pre-sampled destination of the next hop, or `None` before the
    /// engine has sampled one.
    pub fn potential_site(&self) -> Option<SiteId> {
        self.potential_site
            .is_assigned()
            .then_some(self.potential_site)
    }

    /// The waiting time sampled for the pending hop.  `+∞` on a drain.
    pub fn dwell_time(&self) -> f64 {
        self.dwell_time
    }

    pub fn set_potential_site(&mut self, site: SiteId) {
        self.potential_site = site;
    }

    pub fn set_dwell_time(&mut self, dwell_time: f64) {
        self.dwell_time = dwell_time;
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}
