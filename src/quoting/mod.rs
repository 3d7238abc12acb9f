//! Step and route simulation.

pub mod onchain;
pub mod route;
pub mod step;

pub use onchain::OnchainQuoter;
pub use route::{Quote, RouteQuoteEngine};
pub use step::{encode_path, quote_step, StepQuote, StepQuoter, SwapQuote};

/// Which side of the trade is fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeDirection {
    /// Input amount fixed, output simulated
    ExactIn,
    /// Output amount fixed, required input simulated
    ExactOut,
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::ExactIn => write!(f, "exact-in"),
            TradeDirection::ExactOut => write!(f, "exact-out"),
        }
    }
}
