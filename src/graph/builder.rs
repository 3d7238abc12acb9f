use alloy::primitives::Address;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::Asset;
use crate::pools::Pool;

/// Directed token graph with one edge per pool per direction.
///
/// Edge weights index into `pools`.
pub struct PoolGraph {
    pub graph: DiGraph<Asset, usize>,
    pools: Vec<Arc<Pool>>,
    token_to_node: HashMap<Address, NodeIndex>,
}

impl PoolGraph {
    pub fn new(pools: &[Arc<Pool>]) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            pools: Vec::with_capacity(pools.len()),
            token_to_node: HashMap::new(),
        };
        for pool in pools {
            graph.add_pool(pool.clone());
        }
        graph
    }

    fn get_or_create_node(&mut self, token: &Asset) -> NodeIndex {
        if let Some(&node) = self.token_to_node.get(&token.address) {
            node
        } else {
            let node = self.graph.add_node(token.clone());
            self.token_to_node.insert(token.address, node);
            node
        }
    }

    /// Add a pool to the graph, creating edges in both directions
    pub fn add_pool(&mut self, pool: Arc<Pool>) {
        if pool.liquidity == 0 {
            tracing::trace!("Skipping pool {} - no liquidity", pool.address);
            return;
        }

        let node0 = self.get_or_create_node(&pool.token0);
        let node1 = self.get_or_create_node(&pool.token1);
        let index = self.pools.len();
        self.pools.push(pool);

        self.graph.add_edge(node0, node1, index);
        self.graph.add_edge(node1, node0, index);
    }

    pub fn get_node(&self, token: Address) -> Option<NodeIndex> {
        self.token_to_node.get(&token).copied()
    }

    pub fn pool(&self, index: usize) -> &Arc<Pool> {
        &self.pools[index]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pool, usdc, weth, cbbtc};

    #[test]
    fn test_edges_both_directions() {
        let pools = vec![
            Arc::new(pool(0x01, usdc(), weth(), 1_000, 1_000)),
            Arc::new(pool(0x02, weth(), cbbtc(), 1_000, 1_000)),
        ];
        let graph = PoolGraph::new(&pools);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 4);
        assert!(graph.get_node(usdc().address).is_some());
    }

    #[test]
    fn test_empty_pool_skipped() {
        let mut empty = pool(0x01, usdc(), weth(), 1_000, 1_000);
        empty.liquidity = 0;
        let graph = PoolGraph::new(&[Arc::new(empty)]);
        assert_eq!(graph.edge_count(), 0);
    }
}
