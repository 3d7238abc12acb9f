//! Routes that pass through ERC4626 vault conversions.
//!
//! Three independent shapes are enumerated and unioned:
//! - direct conversion: a lone wrap or unwrap
//! - single-pool bridge: `[convert?] swap [convert?]`
//! - two-pool bridge: `[convert?] swap [convert?] swap [convert?]`, exact input only
//!
//! Only same-class pools (both sides boosted or both plain) are bridged.
//! Every emitted route carries at least one vault step; a swap-only path
//! belongs to the regular set.

use alloy::primitives::Address;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;

use super::{Route, RouteKind, RouteStep};
use crate::assets::Asset;
use crate::pools::Pool;
use crate::quoting::TradeDirection;

/// Lone wrap or unwrap when `input` and `output` are vault and underlying
pub fn direct_conversion(input: &Asset, output: &Asset) -> Option<Route> {
    let step = RouteStep::conversion(input, output)?;
    Route::new(input.clone(), output.clone(), vec![step], RouteKind::Boosted).ok()
}

pub fn boosted_routes(
    input: &Asset,
    output: &Asset,
    pools: &[Arc<Pool>],
    direction: TradeDirection,
) -> Vec<Route> {
    let mut routes = RouteAccumulator::default();

    if let Some(route) = direct_conversion(input, output) {
        routes.push(route);
    }

    for route in single_pool_bridges(input, output, pools) {
        routes.push(route);
    }

    if direction == TradeDirection::ExactIn {
        for route in two_pool_bridges(input, output, pools) {
            routes.push(route);
        }
    }

    routes.into_vec()
}

/// Steps moving `from` onto `to`: nothing, one conversion, or `None` if unreachable
fn bridge(from: &Asset, to: &Asset) -> Option<Vec<RouteStep>> {
    if from == to {
        return Some(Vec::new());
    }
    RouteStep::conversion(from, to).map(|step| vec![step])
}

/// Both orientations of a same-class pool as (side in, side out)
fn orientations(pool: &Pool) -> [(&Asset, &Asset); 2] {
    [(&pool.token0, &pool.token1), (&pool.token1, &pool.token0)]
}

fn finish(input: &Asset, output: &Asset, steps: Vec<RouteStep>) -> Option<Route> {
    if !steps.iter().any(RouteStep::is_vault_step) {
        return None;
    }
    match Route::new(input.clone(), output.clone(), steps, RouteKind::Boosted) {
        Ok(route) => Some(route),
        Err(e) => {
            trace!("Skipping boosted candidate: {}", e);
            None
        }
    }
}

fn single_pool_bridges(input: &Asset, output: &Asset, pools: &[Arc<Pool>]) -> Vec<Route> {
    let mut routes = Vec::new();
    for pool in pools.iter().filter(|p| p.is_same_class()) {
        for (side_in, side_out) in orientations(pool) {
            let (Some(entry), Some(exit)) = (bridge(input, side_in), bridge(side_out, output))
            else {
                continue;
            };
            let Ok(swap) = RouteStep::swap(pool.clone(), side_in) else {
                continue;
            };
            let mut steps = entry;
            steps.push(swap);
            steps.extend(exit);
            if let Some(route) = finish(input, output, steps) {
                routes.push(route);
            }
        }
    }
    routes
}

fn two_pool_bridges(input: &Asset, output: &Asset, pools: &[Arc<Pool>]) -> Vec<Route> {
    let mut routes = Vec::new();
    let same_class: Vec<&Arc<Pool>> = pools.iter().filter(|p| p.is_same_class()).collect();

    for first in &same_class {
        for (first_in, intermediate) in orientations(first) {
            let Some(entry) = bridge(input, first_in) else {
                continue;
            };
            // Already served by a single-pool bridge
            if bridge(intermediate, output).is_some() {
                continue;
            }
            let Ok(first_swap) = RouteStep::swap((*first).clone(), first_in) else {
                continue;
            };

            for second in &same_class {
                if second.address == first.address {
                    continue;
                }
                for (second_in, second_out) in orientations(second) {
                    let (Some(middle), Some(exit)) =
                        (bridge(intermediate, second_in), bridge(second_out, output))
                    else {
                        continue;
                    };
                    let Ok(second_swap) = RouteStep::swap((*second).clone(), second_in) else {
                        continue;
                    };

                    let mut steps = entry.clone();
                    steps.push(first_swap.clone());
                    steps.extend(middle);
                    steps.push(second_swap);
                    steps.extend(exit);
                    if let Some(route) = finish(input, output, steps) {
                        routes.push(route);
                    }
                }
            }
        }
    }
    routes
}

#[derive(Default)]
struct RouteAccumulator {
    seen: HashSet<Vec<(u8, Address, Address, Address)>>,
    routes: Vec<Route>,
}

impl RouteAccumulator {
    fn push(&mut self, route: Route) {
        if self.seen.insert(route.signature()) {
            self.routes.push(route);
        }
    }

    fn into_vec(self) -> Vec<Route> {
        self.routes
    }
}
