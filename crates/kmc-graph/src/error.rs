use kmc_core::SiteId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("rate {from} -> {to} has already been added")]
    DuplicateRate { from: SiteId, to: SiteId },

    #[error("no rate has been added for {from} -> {to}")]
    RateNotFound { from: SiteId, to: SiteId },

    #[error("rate {from} -> {to} must be positive and finite, got {rate}")]
    NonPositiveRate { from: SiteId, to: SiteId, rate: f64 },
}

pub type GraphResult<T> = Result<T, GraphError>;
