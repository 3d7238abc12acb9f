//! Multi-hop swap routing and quoting over concentrated-liquidity pools,
//! with ERC4626 vault wrap/unwrap edges for boosted assets.

pub mod assets;
pub mod config;
pub mod display;
pub mod error;
pub mod graph;
pub mod pools;
pub mod quoting;
pub mod routing;
pub mod trade;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, RouterError};
