//! Best trade selection.
//!
//! Candidates are scanned in a fixed order (boosted routes first when boosted
//! routing is on, then regular). Exact input keeps the strictly greatest
//! output seen so far, exact output the strictly smallest input, so the first
//! candidate to reach a value wins ties.

use alloy::primitives::U256;
use tracing::debug;

use super::{Trade, TradeOutput};
use crate::quoting::{Quote, TradeDirection};
use crate::routing::{Route, RouteSet};

#[derive(Debug, Clone, Copy)]
pub struct BestTradeSelector {
    boosted_enabled: bool,
}

impl BestTradeSelector {
    pub fn new(boosted_enabled: bool) -> Self {
        Self { boosted_enabled }
    }

    /// Routes in scan order
    pub fn candidates(&self, routes: &RouteSet) -> Vec<Route> {
        routes.scan_order(self.boosted_enabled)
    }

    /// Index of the winning quote, if any quote is usable
    pub fn best_index(direction: TradeDirection, quotes: &[Option<Quote>]) -> Option<usize> {
        let mut best: Option<(usize, U256)> = None;

        for (index, quote) in quotes.iter().enumerate() {
            let Some(quote) = quote else { continue };
            let value = match direction {
                TradeDirection::ExactIn => quote.output_amount(),
                TradeDirection::ExactOut => quote.input_amount(),
            };
            if value.is_zero() {
                continue;
            }
            let better = match (best, direction) {
                (None, _) => true,
                (Some((_, current)), TradeDirection::ExactIn) => value > current,
                (Some((_, current)), TradeDirection::ExactOut) => value < current,
            };
            if better {
                best = Some((index, value));
            }
        }

        best.map(|(index, _)| index)
    }

    /// Pick the winner among `routes`, whose quotes line up index for index
    pub fn select(
        &self,
        direction: TradeDirection,
        routes: Vec<Route>,
        quotes: Vec<Option<Quote>>,
    ) -> TradeOutput {
        let Some(index) = Self::best_index(direction, &quotes) else {
            debug!("No usable quote among {} routes", routes.len());
            return TradeOutput::no_route(routes);
        };
        let Some(Some(quote)) = quotes.into_iter().nth(index) else {
            return TradeOutput::no_route(routes);
        };
        let Some(route) = routes.get(index).cloned() else {
            return TradeOutput::no_route(routes);
        };

        let trade = Trade::new(route.clone(), quote);
        debug!(
            "Selected {} route {} ({} in, {} out)",
            route.kind(),
            route.token_path(),
            trade.input_amount,
            trade.output_amount
        );
        TradeOutput::valid(routes, trade)
    }
}
