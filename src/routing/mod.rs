//! Routes: ordered chains of swap and vault conversion steps.

pub mod boosted;
pub mod builder;
pub mod regular;

pub use builder::{RouteBuilder, RouteSet};

use alloy::primitives::Address;
use std::collections::HashSet;
use std::sync::Arc;

use crate::assets::Asset;
use crate::error::{Result, RouterError};
use crate::pools::Pool;

#[derive(Debug, Clone)]
pub enum RouteStep {
    Swap {
        pool: Arc<Pool>,
        token_in: Asset,
        token_out: Asset,
    },
    /// Deposit `token_in` into the vault `token_out`
    Wrap { token_in: Asset, token_out: Asset },
    /// Redeem vault shares `token_in` for `token_out`
    Unwrap { token_in: Asset, token_out: Asset },
}

impl RouteStep {
    pub fn swap(pool: Arc<Pool>, token_in: &Asset) -> Result<Self> {
        let token_out = pool.other(token_in).cloned().ok_or_else(|| {
            RouterError::invalid_route(format!("{} is not in pool {}", token_in, pool.address))
        })?;
        // Take the pool's copies so boosted metadata is consistent
        let token_in = pool.other(&token_out).cloned().unwrap_or_else(|| token_in.clone());
        Ok(RouteStep::Swap {
            pool,
            token_in,
            token_out,
        })
    }

    pub fn wrap(underlying: &Asset, vault: &Asset) -> Result<Self> {
        if !vault.wraps(underlying) {
            return Err(RouterError::invalid_route(format!(
                "{} is not a vault over {}",
                vault, underlying
            )));
        }
        Ok(RouteStep::Wrap {
            token_in: underlying.clone(),
            token_out: vault.clone(),
        })
    }

    pub fn unwrap(vault: &Asset, underlying: &Asset) -> Result<Self> {
        if !vault.wraps(underlying) {
            return Err(RouterError::invalid_route(format!(
                "{} is not a vault over {}",
                vault, underlying
            )));
        }
        Ok(RouteStep::Unwrap {
            token_in: vault.clone(),
            token_out: underlying.clone(),
        })
    }

    /// Step converting `from` into `to` without a pool, if they are vault and underlying
    pub fn conversion(from: &Asset, to: &Asset) -> Option<Self> {
        if to.wraps(from) {
            Self::wrap(from, to).ok()
        } else if from.wraps(to) {
            Self::unwrap(from, to).ok()
        } else {
            None
        }
    }

    pub fn token_in(&self) -> &Asset {
        match self {
            RouteStep::Swap { token_in, .. }
            | RouteStep::Wrap { token_in, .. }
            | RouteStep::Unwrap { token_in, .. } => token_in,
        }
    }

    pub fn token_out(&self) -> &Asset {
        match self {
            RouteStep::Swap { token_out, .. }
            | RouteStep::Wrap { token_out, .. }
            | RouteStep::Unwrap { token_out, .. } => token_out,
        }
    }

    pub fn pool(&self) -> Option<&Arc<Pool>> {
        match self {
            RouteStep::Swap { pool, .. } => Some(pool),
            _ => None,
        }
    }

    pub fn is_vault_step(&self) -> bool {
        !matches!(self, RouteStep::Swap { .. })
    }

    fn signature(&self) -> (u8, Address, Address, Address) {
        let (tag, pool) = match self {
            RouteStep::Swap { pool, .. } => (0, pool.address),
            RouteStep::Wrap { .. } => (1, Address::ZERO),
            RouteStep::Unwrap { .. } => (2, Address::ZERO),
        };
        (tag, pool, self.token_in().address, self.token_out().address)
    }
}

impl std::fmt::Display for RouteStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteStep::Swap { token_in, token_out, .. } => {
                write!(f, "SWAP({} -> {})", token_in, token_out)
            }
            RouteStep::Wrap { token_in, token_out } => {
                write!(f, "WRAP({} -> {})", token_in, token_out)
            }
            RouteStep::Unwrap { token_in, token_out } => {
                write!(f, "UNWRAP({} -> {})", token_in, token_out)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    /// Pool swaps only
    Regular,
    /// Contains at least one wrap/unwrap step
    Boosted,
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteKind::Regular => write!(f, "regular"),
            RouteKind::Boosted => write!(f, "boosted"),
        }
    }
}

/// A validated path from `input` to `output`. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Route {
    steps: Vec<RouteStep>,
    input: Asset,
    output: Asset,
    kind: RouteKind,
}

impl Route {
    pub fn new(
        input: Asset,
        output: Asset,
        steps: Vec<RouteStep>,
        kind: RouteKind,
    ) -> Result<Self> {
        let (Some(first), Some(last)) = (steps.first(), steps.last()) else {
            return Err(RouterError::invalid_route("route has no steps"));
        };
        if input == output {
            return Err(RouterError::invalid_route("input and output are the same asset"));
        }
        if *first.token_in() != input {
            return Err(RouterError::invalid_route(format!("route does not start at {}", input)));
        }
        if *last.token_out() != output {
            return Err(RouterError::invalid_route(format!("route does not end at {}", output)));
        }
        for pair in steps.windows(2) {
            if pair[0].token_out() != pair[1].token_in() {
                return Err(RouterError::invalid_route(format!(
                    "discontinuity between {} and {}",
                    pair[0], pair[1]
                )));
            }
        }

        let mut pools = HashSet::new();
        for pool in steps.iter().filter_map(RouteStep::pool) {
            if !pools.insert(pool.address) {
                return Err(RouterError::invalid_route(format!("pool {} reused", pool.address)));
            }
        }

        let has_vault_step = steps.iter().any(RouteStep::is_vault_step);
        match kind {
            RouteKind::Regular if has_vault_step => {
                return Err(RouterError::invalid_route("regular route with a vault step"));
            }
            RouteKind::Boosted if !has_vault_step => {
                return Err(RouterError::invalid_route("boosted route without a vault step"));
            }
            _ => {}
        }

        Ok(Self {
            steps,
            input,
            output,
            kind,
        })
    }

    pub fn steps(&self) -> &[RouteStep] {
        &self.steps
    }

    pub fn input(&self) -> &Asset {
        &self.input
    }

    pub fn output(&self) -> &Asset {
        &self.output
    }

    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    pub fn pools(&self) -> impl Iterator<Item = &Arc<Pool>> {
        self.steps.iter().filter_map(RouteStep::pool)
    }

    /// Identity of the step sequence, used for deduplication
    pub fn signature(&self) -> Vec<(u8, Address, Address, Address)> {
        self.steps.iter().map(RouteStep::signature).collect()
    }

    pub fn token_path(&self) -> String {
        let mut path = vec![self.input.symbol.clone()];
        path.extend(self.steps.iter().map(|s| s.token_out().symbol.clone()));
        path.join(" -> ")
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let steps: Vec<String> = self.steps.iter().map(|s| s.to_string()).collect();
        write!(f, "[{}] {}", self.kind, steps.join(", "))
    }
}
