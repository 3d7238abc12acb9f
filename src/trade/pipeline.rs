//! Request pipeline.
//!
//! [`Router`] runs one request end to end: candidate pairs, pool discovery,
//! route building, concurrent quoting and selection. [`TradeSession`] keeps
//! only the latest request alive: submitting aborts whatever is in flight and
//! results from a superseded generation are dropped before publication.

use alloy::primitives::U256;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use super::selector::BestTradeSelector;
use super::TradeOutput;
use crate::assets::Asset;
use crate::error::{Result, RouterError};
use crate::graph::AssetGraphBuilder;
use crate::pools::PoolDiscovery;
use crate::quoting::{RouteQuoteEngine, TradeDirection};
use crate::routing::boosted::direct_conversion;
use crate::routing::{RouteBuilder, RouteSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingMode {
    /// Pool swaps only
    Regular,
    /// Pool swaps plus routes through vault conversions
    Boosted,
}

impl RoutingMode {
    pub fn boosted_enabled(self) -> bool {
        self == RoutingMode::Boosted
    }
}

#[derive(Debug, Clone)]
pub struct TradeRequest {
    pub asset_in: Option<Asset>,
    pub asset_out: Option<Asset>,
    pub amount: Option<U256>,
    pub direction: TradeDirection,
    pub routing_mode: RoutingMode,
}

impl TradeRequest {
    pub fn new(asset_in: Asset, asset_out: Asset, amount: U256, direction: TradeDirection) -> Self {
        Self {
            asset_in: Some(asset_in),
            asset_out: Some(asset_out),
            amount: Some(amount),
            direction,
            routing_mode: RoutingMode::Boosted,
        }
    }

    pub fn with_mode(mut self, routing_mode: RoutingMode) -> Self {
        self.routing_mode = routing_mode;
        self
    }

    /// The complete request, or `AssetMissing`
    pub fn parts(&self) -> Result<(&Asset, &Asset, U256)> {
        match (&self.asset_in, &self.asset_out, self.amount) {
            (Some(asset_in), Some(asset_out), Some(amount))
                if !amount.is_zero() && asset_in != asset_out =>
            {
                Ok((asset_in, asset_out, amount))
            }
            _ => Err(RouterError::AssetMissing),
        }
    }
}

pub struct Router {
    pairs: AssetGraphBuilder,
    discovery: PoolDiscovery,
    routes: RouteBuilder,
    engine: RouteQuoteEngine,
}

impl Router {
    pub fn new(
        pairs: AssetGraphBuilder,
        discovery: PoolDiscovery,
        routes: RouteBuilder,
        engine: RouteQuoteEngine,
    ) -> Self {
        Self {
            pairs,
            discovery,
            routes,
            engine,
        }
    }

    pub fn engine(&self) -> &RouteQuoteEngine {
        &self.engine
    }

    /// Candidate routes for a pair.
    ///
    /// A vault/underlying pair in boosted mode is a single conversion and
    /// skips pool discovery entirely.
    pub async fn candidate_routes(
        &self,
        asset_in: &Asset,
        asset_out: &Asset,
        direction: TradeDirection,
        boosted_enabled: bool,
    ) -> RouteSet {
        if boosted_enabled {
            if let Some(route) = direct_conversion(asset_in, asset_out) {
                trace!("Direct conversion {} -> {}", asset_in, asset_out);
                return RouteSet {
                    regular: Vec::new(),
                    boosted: vec![route],
                };
            }
        }

        let pairs = self.pairs.candidate_pairs(Some(asset_in), Some(asset_out));
        let pools = self.discovery.discover(&pairs).await;
        self.routes
            .build(asset_in, asset_out, &pools, direction, boosted_enabled)
    }

    pub async fn route(&self, request: &TradeRequest) -> TradeOutput {
        let Ok((asset_in, asset_out, amount)) = request.parts() else {
            return TradeOutput::invalid();
        };

        let selector = BestTradeSelector::new(request.routing_mode.boosted_enabled());
        let set = self
            .candidate_routes(
                asset_in,
                asset_out,
                request.direction,
                request.routing_mode.boosted_enabled(),
            )
            .await;
        let candidates = selector.candidates(&set);
        if candidates.is_empty() {
            debug!("{}", RouterError::RouteNotFound);
            return TradeOutput::no_route(candidates);
        }

        let quotes = self
            .engine
            .quote_all(&candidates, amount, request.direction)
            .await;
        selector.select(request.direction, candidates, quotes)
    }
}

/// Latest published output together with the request generation it answers
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub generation: u64,
    pub output: TradeOutput,
}

struct SessionState {
    generation: u64,
    inflight: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<SessionState>,
    tx: watch::Sender<SessionUpdate>,
}

impl Shared {
    /// Publish only if `generation` is still the latest request
    fn publish(&self, generation: u64, output: TradeOutput) -> bool {
        let state = self.state.lock();
        if state.generation != generation {
            trace!(
                "Discarding stale result for generation {} (current {})",
                generation,
                state.generation
            );
            return false;
        }
        self.tx.send_replace(SessionUpdate { generation, output });
        true
    }
}

/// Supersede-on-change driver for a stream of requests
pub struct TradeSession {
    router: Arc<Router>,
    shared: Arc<Shared>,
}

impl TradeSession {
    pub fn new(router: Arc<Router>) -> Self {
        let (tx, _) = watch::channel(SessionUpdate {
            generation: 0,
            output: TradeOutput::invalid(),
        });
        Self {
            router,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState {
                    generation: 0,
                    inflight: None,
                }),
                tx,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionUpdate> {
        self.shared.tx.subscribe()
    }

    pub fn latest(&self) -> SessionUpdate {
        self.shared.tx.borrow().clone()
    }

    /// Start computing `request`, cancelling any previous one.
    ///
    /// Must be called from within a tokio runtime. Returns the request's generation.
    pub fn submit(&self, request: TradeRequest) -> u64 {
        let mut state = self.shared.state.lock();
        state.generation += 1;
        let generation = state.generation;

        if let Some(previous) = state.inflight.take() {
            previous.abort();
        }

        if request.parts().is_err() {
            self.shared.tx.send_replace(SessionUpdate {
                generation,
                output: TradeOutput::invalid(),
            });
            return generation;
        }

        self.shared.tx.send_replace(SessionUpdate {
            generation,
            output: TradeOutput::loading(Vec::new()),
        });

        let router = self.router.clone();
        let shared = self.shared.clone();
        state.inflight = Some(tokio::spawn(async move {
            let output = router.route(&request).await;
            if shared.publish(generation, output) {
                info!("Published trade state for generation {}", generation);
            }
        }));

        generation
    }
}

impl Drop for TradeSession {
    fn drop(&mut self) {
        if let Some(handle) = self.shared.state.lock().inflight.take() {
            handle.abort();
        }
    }
}
