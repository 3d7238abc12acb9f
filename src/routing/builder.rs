use std::sync::Arc;
use tracing::debug;

use super::boosted::boosted_routes;
use super::regular::regular_routes;
use super::Route;
use crate::assets::Asset;
use crate::config::thresholds;
use crate::pools::Pool;
use crate::quoting::TradeDirection;

/// Candidate routes for one request, split by kind
#[derive(Debug, Clone, Default)]
pub struct RouteSet {
    pub regular: Vec<Route>,
    pub boosted: Vec<Route>,
}

impl RouteSet {
    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.boosted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regular.len() + self.boosted.len()
    }

    /// Routes in selection scan order: boosted first (when enabled), then regular
    pub fn scan_order(&self, boosted_enabled: bool) -> Vec<Route> {
        let mut routes = Vec::with_capacity(self.len());
        if boosted_enabled {
            routes.extend(self.boosted.iter().cloned());
        }
        routes.extend(self.regular.iter().cloned());
        routes
    }
}

#[derive(Debug, Clone)]
pub struct RouteBuilder {
    max_hops: usize,
}

impl Default for RouteBuilder {
    fn default() -> Self {
        Self::new(thresholds::MAX_HOPS)
    }
}

impl RouteBuilder {
    pub fn new(max_hops: usize) -> Self {
        Self { max_hops }
    }

    pub fn build(
        &self,
        input: &Asset,
        output: &Asset,
        pools: &[Arc<Pool>],
        direction: TradeDirection,
        boosted_enabled: bool,
    ) -> RouteSet {
        let regular = regular_routes(input, output, pools, self.max_hops);
        let boosted = if boosted_enabled {
            boosted_routes(input, output, pools, direction)
        } else {
            Vec::new()
        };

        debug!(
            "Built {} regular and {} boosted routes {} -> {} over {} pools",
            regular.len(),
            boosted.len(),
            input,
            output,
            pools.len()
        );

        RouteSet { regular, boosted }
    }
}
