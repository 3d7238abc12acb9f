//! Error taxonomy for the routing engine.
//!
//! None of these are fatal: the pipeline folds every failure into one of the
//! [`TradeState`](crate::trade::TradeState) values.

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Request is incomplete (missing input asset, output asset or amount)
    #[error("input asset, output asset or amount missing")]
    AssetMissing,

    #[error("no route found")]
    RouteNotFound,

    /// A single preview/quoter call reverted or returned malformed data
    #[error("{step} simulation failed: {reason}")]
    StepSimulation { step: String, reason: String },

    #[error("pool indexer unavailable: {0}")]
    IndexerUnavailable(String),

    /// Candidate route violated a structural invariant
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error("failed to classify asset {address}: {reason}")]
    Classification { address: Address, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RouterError>;

impl RouterError {
    pub fn step(step: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        RouterError::StepSimulation {
            step: step.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_route(reason: impl Into<String>) -> Self {
        RouterError::InvalidRoute(reason.into())
    }
}
