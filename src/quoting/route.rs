//! Whole-route simulation.
//!
//! Exact input walks the steps forward, feeding each output into the next
//! input. Exact output walks backward from the requested output, each step's
//! required input becoming the previous step's target; hop data is collected
//! in walk order and reversed once, so a [`Quote`] is always chronological.

use alloy::primitives::U256;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use super::step::{quote_step, StepQuote, StepQuoter};
use super::TradeDirection;
use crate::error::{Result, RouterError};
use crate::routing::Route;

/// Per-hop simulation of one route, indexed in execution order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub direction: TradeDirection,
    pub amounts_in: Vec<U256>,
    pub amounts_out: Vec<U256>,
    /// `None` for vault hops
    pub sqrt_prices_after: Vec<Option<U256>>,
    pub ticks_crossed: Vec<u32>,
    pub fees: Vec<u32>,
    pub gas_estimate: u64,
}

impl Quote {
    fn with_capacity(direction: TradeDirection, hops: usize) -> Self {
        Self {
            direction,
            amounts_in: Vec::with_capacity(hops),
            amounts_out: Vec::with_capacity(hops),
            sqrt_prices_after: Vec::with_capacity(hops),
            ticks_crossed: Vec::with_capacity(hops),
            fees: Vec::with_capacity(hops),
            gas_estimate: 0,
        }
    }

    fn record(&mut self, step: StepQuote) {
        self.amounts_in.push(step.amount_in);
        self.amounts_out.push(step.amount_out);
        self.sqrt_prices_after.push(step.sqrt_price_after);
        self.ticks_crossed.push(step.ticks_crossed);
        self.fees.push(step.fee);
        self.gas_estimate = self.gas_estimate.saturating_add(step.gas_estimate);
    }

    fn reverse(&mut self) {
        self.amounts_in.reverse();
        self.amounts_out.reverse();
        self.sqrt_prices_after.reverse();
        self.ticks_crossed.reverse();
        self.fees.reverse();
    }

    /// Amount entering the first hop
    pub fn input_amount(&self) -> U256 {
        self.amounts_in.first().copied().unwrap_or_default()
    }

    /// Amount leaving the last hop
    pub fn output_amount(&self) -> U256 {
        self.amounts_out.last().copied().unwrap_or_default()
    }

    pub fn hop_count(&self) -> usize {
        self.amounts_in.len()
    }
}

pub struct RouteQuoteEngine {
    quoter: Arc<dyn StepQuoter>,
}

impl RouteQuoteEngine {
    pub fn new(quoter: Arc<dyn StepQuoter>) -> Self {
        Self { quoter }
    }

    /// Quote one route. Any failing step fails the whole route.
    pub async fn quote(
        &self,
        route: &Route,
        amount: U256,
        direction: TradeDirection,
    ) -> Result<Quote> {
        if amount.is_zero() {
            return Err(RouterError::step(route, "zero amount requested"));
        }

        let steps = route.steps();
        let mut quote = Quote::with_capacity(direction, steps.len());
        let mut current = amount;

        match direction {
            TradeDirection::ExactIn => {
                for step in steps {
                    let hop = quote_step(self.quoter.as_ref(), step, current, direction).await?;
                    current = hop.amount_out;
                    quote.record(hop);
                }
            }
            TradeDirection::ExactOut => {
                for step in steps.iter().rev() {
                    let hop = quote_step(self.quoter.as_ref(), step, current, direction).await?;
                    current = hop.amount_in;
                    quote.record(hop);
                }
                quote.reverse();
            }
        }

        Ok(quote)
    }

    /// Quote every route concurrently.
    ///
    /// Results line up with `routes`; a failed route is `None` and does not
    /// affect its siblings.
    pub async fn quote_all(
        &self,
        routes: &[Route],
        amount: U256,
        direction: TradeDirection,
    ) -> Vec<Option<Quote>> {
        let futures = routes.iter().map(|route| self.quote(route, amount, direction));
        let results = join_all(futures).await;

        let mut quotes = Vec::with_capacity(results.len());
        for (route, result) in routes.iter().zip(results) {
            match result {
                Ok(quote) => quotes.push(Some(quote)),
                Err(e) => {
                    warn!("Dropping quote for {}: {}", route, e);
                    quotes.push(None);
                }
            }
        }

        debug!(
            "Quoted {}/{} routes {} for {}",
            quotes.iter().filter(|q| q.is_some()).count(),
            routes.len(),
            direction,
            amount
        );
        quotes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{RouteKind, RouteStep};
    use crate::testing::{cbbtc, usdc, v_weth, weth, Market};

    fn two_hop(market: &mut Market) -> Route {
        let a = market.add_pool(0x01, usdc(), weth(), 4_000_000_000, 1_000_000);
        let swap = RouteStep::swap(a, &usdc()).unwrap();
        let wrap = RouteStep::wrap(&weth(), &v_weth()).unwrap();
        Route::new(usdc(), v_weth(), vec![swap, wrap], RouteKind::Boosted).unwrap()
    }

    #[tokio::test]
    async fn test_exact_in_chains_forward() {
        let mut market = Market::new();
        let route = two_hop(&mut market);
        let engine = market.engine();

        let quote = engine
            .quote(&route, U256::from(1_000_000u64), TradeDirection::ExactIn)
            .await
            .unwrap();
        assert_eq!(quote.hop_count(), 2);
        assert_eq!(quote.input_amount(), U256::from(1_000_000u64));
        assert_eq!(quote.amounts_out[0], quote.amounts_in[1]);
        assert!(quote.sqrt_prices_after[0].is_some());
        assert!(quote.sqrt_prices_after[1].is_none());
    }

    #[tokio::test]
    async fn test_exact_out_is_chronological() {
        let mut market = Market::new();
        let route = two_hop(&mut market);
        let engine = market.engine();
        let target = U256::from(100u64);

        let quote = engine.quote(&route, target, TradeDirection::ExactOut).await.unwrap();
        assert_eq!(quote.output_amount(), target);
        assert_eq!(quote.amounts_out[0], quote.amounts_in[1]);
        // first hop is the swap, so its price-after is present
        assert!(quote.sqrt_prices_after[0].is_some());

        // feeding the required input forward reaches the target
        let forward = engine
            .quote(&route, quote.input_amount(), TradeDirection::ExactIn)
            .await
            .unwrap();
        assert!(forward.output_amount() >= target);
    }

    #[tokio::test]
    async fn test_exact_in_monotonic() {
        let mut market = Market::new();
        let route = two_hop(&mut market);
        let engine = market.engine();

        let mut last = U256::ZERO;
        for amount in [10u64, 100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000] {
            let out = engine
                .quote(&route, U256::from(amount), TradeDirection::ExactIn)
                .await
                .map(|q| q.output_amount())
                .unwrap_or_default();
            assert!(out >= last, "{} produced {} < {}", amount, out, last);
            last = out;
        }
    }

    #[tokio::test]
    async fn test_failure_isolated_to_route() {
        let mut market = Market::new();
        let good = market.add_pool(0x01, usdc(), weth(), 1_000_000, 1_000_000);
        let bad = market.add_pool(0x02, usdc(), cbbtc(), 1_000_000, 1_000_000);
        let bad_exit = market.add_pool(0x03, cbbtc(), weth(), 1_000_000, 1_000_000);
        market.quoter.fail_pool(&bad);

        let failing = vec![
            RouteStep::swap(bad, &usdc()).unwrap(),
            RouteStep::swap(bad_exit, &cbbtc()).unwrap(),
        ];
        let working = vec![RouteStep::swap(good, &usdc()).unwrap()];
        let routes = vec![
            Route::new(usdc(), weth(), failing, RouteKind::Regular).unwrap(),
            Route::new(usdc(), weth(), working, RouteKind::Regular).unwrap(),
        ];
        let quotes = market
            .engine()
            .quote_all(&routes, U256::from(1_000u64), TradeDirection::ExactIn)
            .await;
        assert_eq!(quotes.len(), 2);
        assert!(quotes[0].is_none());
        assert!(quotes[1].is_some());
    }

    #[tokio::test]
    async fn test_zero_amount_fails() {
        let mut market = Market::new();
        let route = two_hop(&mut market);
        assert!(market.engine().quote(&route, U256::ZERO, TradeDirection::ExactIn).await.is_err());
    }
}
