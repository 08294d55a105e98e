use kmc_core::{ClusterId, SiteId, WalkerId};
use kmc_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0} must be called after the system is initialized")]
    NotInitialized(&'static str),

    #[error("the random seed must be set before initialize_system is called")]
    SeedAfterInitialize,

    #[error("{0} is not registered in the system")]
    UnknownSite(SiteId),

    #[error("{0} does not refer to a live cluster")]
    UnknownCluster(ClusterId),

    #[error("walker {0} has not been placed on a site")]
    WalkerUnplaced(WalkerId),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type EngineResult<T> = Result<T, EngineError>;
