use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::HashSet;

use super::builder::PoolGraph;
use crate::assets::Asset;

/// One pool traversal in a token path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub pool: usize,
    pub from: NodeIndex,
    pub to: NodeIndex,
}

/// Bounded depth-first search for simple token paths between two assets
pub struct BoundedPathFinder<'a> {
    graph: &'a PoolGraph,
    max_hops: usize,
}

impl<'a> BoundedPathFinder<'a> {
    pub fn new(graph: &'a PoolGraph, max_hops: usize) -> Self {
        Self { graph, max_hops }
    }

    /// All paths from `from` to `to` using at most `max_hops` pools.
    ///
    /// Paths never revisit a token or reuse a pool. Order follows edge
    /// insertion, so identical inputs yield identical output.
    pub fn find_paths(&self, from: &Asset, to: &Asset) -> Vec<Vec<Hop>> {
        let mut paths = Vec::new();
        if from == to {
            return paths;
        }
        let (Some(start), Some(target)) = (
            self.graph.get_node(from.address),
            self.graph.get_node(to.address),
        ) else {
            return paths;
        };

        let mut visited = HashSet::new();
        visited.insert(start);
        self.dfs(start, target, &mut Vec::new(), &mut visited, &mut paths);

        tracing::trace!(
            "Found {} paths {} -> {} (max {} hops)",
            paths.len(),
            from,
            to,
            self.max_hops
        );
        paths
    }

    fn dfs(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        hops: &mut Vec<Hop>,
        visited: &mut HashSet<NodeIndex>,
        paths: &mut Vec<Vec<Hop>>,
    ) {
        if hops.len() >= self.max_hops {
            return;
        }

        for edge in self.graph.graph.edges(current) {
            let next = edge.target();
            let pool = *edge.weight();

            if hops.iter().any(|h| h.pool == pool) {
                continue;
            }

            let hop = Hop {
                pool,
                from: current,
                to: next,
            };

            if next == target {
                let mut path = hops.clone();
                path.push(hop);
                paths.push(path);
            } else if visited.insert(next) {
                hops.push(hop);
                self.dfs(next, target, hops, visited, paths);
                hops.pop();
                visited.remove(&next);
            }
        }
    }
}
