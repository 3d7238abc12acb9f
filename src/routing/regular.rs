//! Pure AMM multi-hop routes.

use std::sync::Arc;
use tracing::trace;

use super::{Route, RouteKind, RouteStep};
use crate::assets::Asset;
use crate::error::Result;
use crate::graph::{BoundedPathFinder, Hop, PoolGraph};
use crate::pools::Pool;

pub fn regular_routes(
    input: &Asset,
    output: &Asset,
    pools: &[Arc<Pool>],
    max_hops: usize,
) -> Vec<Route> {
    let graph = PoolGraph::new(pools);
    let paths = BoundedPathFinder::new(&graph, max_hops).find_paths(input, output);

    paths
        .into_iter()
        .filter_map(|path| match path_to_route(&graph, input, output, &path) {
            Ok(route) => Some(route),
            Err(e) => {
                trace!("Skipping regular candidate: {}", e);
                None
            }
        })
        .collect()
}

fn path_to_route(graph: &PoolGraph, input: &Asset, output: &Asset, path: &[Hop]) -> Result<Route> {
    let mut steps = Vec::with_capacity(path.len());
    let mut current = input.clone();
    for hop in path {
        let step = RouteStep::swap(graph.pool(hop.pool).clone(), &current)?;
        current = step.token_out().clone();
        steps.push(step);
    }
    Route::new(input.clone(), output.clone(), steps, RouteKind::Regular)
}
