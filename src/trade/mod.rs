pub mod pipeline;
pub mod selector;

pub use pipeline::{Router, RoutingMode, SessionUpdate, TradeRequest, TradeSession};
pub use selector::BestTradeSelector;

use alloy::primitives::U256;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::pools::{sqrt_price_to_raw_price, u256_to_f64_safe};
use crate::quoting::{Quote, TradeDirection};
use crate::routing::{Route, RouteStep};

const BPS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeState {
    /// Request incomplete
    Invalid,
    Loading,
    Valid,
    NoRouteFound,
}

impl std::fmt::Display for TradeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeState::Invalid => write!(f, "INVALID"),
            TradeState::Loading => write!(f, "LOADING"),
            TradeState::Valid => write!(f, "VALID"),
            TradeState::NoRouteFound => write!(f, "NO_ROUTE_FOUND"),
        }
    }
}

/// The selected route with its quote and derived amounts
#[derive(Debug, Clone)]
pub struct Trade {
    pub route: Route,
    pub quote: Quote,
    pub direction: TradeDirection,
    pub input_amount: U256,
    pub output_amount: U256,
    /// Per-hop fees, hundredths of a bip (0 for vault hops)
    pub fees: Vec<u32>,
    /// Percent
    pub price_impact: Decimal,
    /// Per-hop outputs for slippage-bounded exact-output execution
    pub step_amounts_out: Option<Vec<U256>>,
}

impl Trade {
    pub fn new(route: Route, quote: Quote) -> Self {
        let price_impact = price_impact(&route, &quote);
        let step_amounts_out = match quote.direction {
            TradeDirection::ExactOut => Some(quote.amounts_out.clone()),
            TradeDirection::ExactIn => None,
        };
        Self {
            direction: quote.direction,
            input_amount: quote.input_amount(),
            output_amount: quote.output_amount(),
            fees: quote.fees.clone(),
            price_impact,
            step_amounts_out,
            route,
            quote,
        }
    }

    /// Output per unit of input, decimal adjusted
    pub fn execution_price(&self) -> Decimal {
        if self.input_amount.is_zero() {
            return Decimal::ZERO;
        }
        let input = u256_to_f64_safe(self.input_amount)
            / 10_f64.powi(self.route.input().decimals as i32);
        let output = u256_to_f64_safe(self.output_amount)
            / 10_f64.powi(self.route.output().decimals as i32);
        Decimal::from_f64(output / input).unwrap_or_default()
    }

    /// Lowest acceptable output under `slippage_bps`; exact for exact-output trades
    pub fn minimum_amount_out(&self, slippage_bps: u32) -> U256 {
        match self.direction {
            TradeDirection::ExactIn => {
                let keep = BPS.saturating_sub(slippage_bps as u64);
                scale_bps(self.output_amount, keep, false)
            }
            TradeDirection::ExactOut => self.output_amount,
        }
    }

    /// Highest acceptable input under `slippage_bps`; exact for exact-input trades
    pub fn maximum_amount_in(&self, slippage_bps: u32) -> U256 {
        match self.direction {
            TradeDirection::ExactIn => self.input_amount,
            TradeDirection::ExactOut => self
                .input_amount
                .saturating_add(scale_bps(self.input_amount, slippage_bps as u64, true)),
        }
    }

    pub fn gas_estimate(&self) -> u64 {
        self.quote.gas_estimate
    }
}

/// `amount * bps / 10_000` without the intermediate product overflowing
fn scale_bps(amount: U256, bps: u64, round_up: bool) -> U256 {
    let (whole, rest) = amount.div_rem(U256::from(BPS));
    let rest = rest * U256::from(bps);
    let rest = if round_up {
        rest.div_ceil(U256::from(BPS))
    } else {
        rest / U256::from(BPS)
    };
    whole.saturating_mul(U256::from(bps)).saturating_add(rest)
}

/// Price impact in percent.
///
/// Each swap hop contributes the ratio of its post-trade to pre-trade spot
/// rate in the traded direction; vault hops do not move a price. The impact
/// is `1 - product` of those ratios.
pub fn price_impact(route: &Route, quote: &Quote) -> Decimal {
    let mut ratio = 1.0_f64;

    for (step, after) in route.steps().iter().zip(&quote.sqrt_prices_after) {
        let (RouteStep::Swap { pool, token_in, .. }, Some(after)) = (step, after) else {
            continue;
        };
        let before = sqrt_price_to_raw_price(pool.sqrt_price_x96);
        let after = sqrt_price_to_raw_price(*after);
        if before <= 0.0 || after <= 0.0 {
            continue;
        }
        ratio *= if pool.zero_for_one(token_in) {
            after / before
        } else {
            before / after
        };
    }

    let impact = ((1.0 - ratio) * 100.0).max(0.0);
    Decimal::from_f64(impact).unwrap_or_default().round_dp(4)
}

/// What consumers see for a request
#[derive(Debug, Clone)]
pub struct TradeOutput {
    pub loading: bool,
    pub routes: Vec<Route>,
    pub trade: Option<Trade>,
    pub state: TradeState,
}

impl TradeOutput {
    pub fn invalid() -> Self {
        Self {
            loading: false,
            routes: Vec::new(),
            trade: None,
            state: TradeState::Invalid,
        }
    }

    pub fn loading(routes: Vec<Route>) -> Self {
        Self {
            loading: true,
            routes,
            trade: None,
            state: TradeState::Loading,
        }
    }

    pub fn no_route(routes: Vec<Route>) -> Self {
        Self {
            loading: false,
            routes,
            trade: None,
            state: TradeState::NoRouteFound,
        }
    }

    pub fn valid(routes: Vec<Route>, trade: Trade) -> Self {
        Self {
            loading: false,
            routes,
            trade: Some(trade),
            state: TradeState::Valid,
        }
    }
}
