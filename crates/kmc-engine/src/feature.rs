//! Topology-feature dispatch.
//!
//! The walker loop hops against one uniform interface, whether the id it
//! lands on is a bare site or a site that has been absorbed into a cluster.
//! The dispatch table records, per site id, which feature currently answers
//! for it.  Coarse-graining rewrites entries; `hop` only reads them.
//!
//! The two variants share no implementation, so this is a tagged enum with
//! pattern-matched dispatch in the system rather than a trait object.

use std::collections::BTreeMap;

use kmc_core::{ClusterId, SiteId};

/// The feature currently responsible for a site id.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Feature {
    /// The site answers for itself.
    Site(SiteId),
    /// The site has been absorbed; the cluster answers for it.
    Cluster(ClusterId),
}

/// `SiteId → Feature` lookup covering every registered site, drains included.
#[derive(Default, Debug)]
pub struct Dispatch {
    map: BTreeMap<SiteId, Feature>,
}

impl Dispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a site as answering for itself.
    pub fn register_site(&mut self, site: SiteId) {
        self.map.insert(site, Feature::Site(site));
    }

    /// Rebind a site to the cluster that absorbed it.
    pub fn bind_cluster(&mut self, site: SiteId, cluster: ClusterId) {
        self.map.insert(site, Feature::Cluster(cluster));
    }

    /// The feature answering for `site`, or `None` if unregistered.
    pub fn feature_of(&self, site: SiteId) -> Option<Feature> {
        self.map.get(&site).copied()
    }

    pub fn contains(&self, site: SiteId) -> bool {
        self.map.contains_key(&site)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
