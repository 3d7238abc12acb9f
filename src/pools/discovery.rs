//! Pool discovery
//!
//! Candidate pairs -> derived pool addresses (default and custom deployers)
//! -> one bulk indexer lookup -> live [`Pool`] snapshots.

use alloy::primitives::{Address, B256};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::address::derive_pool_address;
use super::indexer::{PoolIndexer, PoolRecord};
use super::Pool;
use crate::assets::{Asset, AssetClassifier};
use crate::graph::AssetPair;

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub pool_deployer: Address,
    pub init_code_hash: B256,
    pub custom_deployers: Vec<Address>,
}

impl DiscoveryConfig {
    /// Default deployer first (as `Address::ZERO`), then every custom deployer
    fn deployers(&self) -> impl Iterator<Item = Address> + '_ {
        std::iter::once(Address::ZERO).chain(self.custom_deployers.iter().copied())
    }
}

/// Where a derived address came from
struct Candidate<'a> {
    pair: &'a AssetPair,
    deployer: Address,
}

pub struct PoolDiscovery {
    config: DiscoveryConfig,
    indexer: Arc<dyn PoolIndexer>,
    classifier: Arc<dyn AssetClassifier>,
}

impl PoolDiscovery {
    pub fn new(
        config: DiscoveryConfig,
        indexer: Arc<dyn PoolIndexer>,
        classifier: Arc<dyn AssetClassifier>,
    ) -> Self {
        Self {
            config,
            indexer,
            classifier,
        }
    }

    pub fn pool_address(&self, pair: &AssetPair, deployer: Address) -> Address {
        let custom = (deployer != Address::ZERO).then_some(deployer);
        derive_pool_address(
            self.config.pool_deployer,
            self.config.init_code_hash,
            pair.a.address,
            pair.b.address,
            custom,
        )
    }

    /// Live pools for the candidate pairs, sorted by address.
    ///
    /// An unavailable indexer yields an empty set.
    pub async fn discover(&self, pairs: &[AssetPair]) -> Vec<Arc<Pool>> {
        let mut candidates: HashMap<Address, Candidate> = HashMap::new();
        let mut addresses = Vec::new();
        for pair in pairs {
            for deployer in self.config.deployers() {
                let address = self.pool_address(pair, deployer);
                if candidates.insert(address, Candidate { pair, deployer }).is_none() {
                    addresses.push(address);
                }
            }
        }

        if addresses.is_empty() {
            return Vec::new();
        }

        let records = match self.indexer.pools_by_address(&addresses).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Pool discovery failed, continuing with no pools: {}", e);
                return Vec::new();
            }
        };

        let live: Vec<(&PoolRecord, &Candidate)> = records
            .iter()
            .filter_map(|record| {
                if record.liquidity == 0 {
                    trace!("Skipping pool {} - zero liquidity", record.address);
                    return None;
                }
                match candidates.get(&record.address) {
                    Some(candidate) => Some((record, candidate)),
                    None => {
                        trace!("Ignoring unrequested pool {}", record.address);
                        None
                    }
                }
            })
            .collect();

        let hydrated =
            join_all(live.iter().map(|(record, candidate)| self.hydrate(record, candidate))).await;

        let mut pools = Vec::with_capacity(hydrated.len());
        for ((record, _), pool) in live.iter().zip(hydrated) {
            match pool {
                Some(pool) => pools.push(Arc::new(pool)),
                None => trace!("Skipping pool {} - token mismatch", record.address),
            }
        }

        pools.sort_by_key(|p| p.address);
        pools.dedup_by_key(|p| p.address);

        debug!(
            "Discovered {} live pools from {} candidate addresses ({} pairs)",
            pools.len(),
            addresses.len(),
            pairs.len()
        );
        pools
    }

    async fn hydrate(&self, record: &PoolRecord, candidate: &Candidate<'_>) -> Option<Pool> {
        let (expected0, expected1) = candidate.pair.sorted();
        if (record.token0, record.token1) != (expected0.address, expected1.address) {
            return None;
        }

        let (token0, token1) = tokio::join!(
            self.asset(record.token0, expected0),
            self.asset(record.token1, expected1)
        );

        Some(Pool::new(
            record.address,
            token0,
            token1,
            record.fee,
            candidate.deployer,
            record.liquidity,
            record.tick,
            record.sqrt_price_x96,
            record.tick_spacing,
        ))
    }

    /// Re-classify so the pool carries the freshest boosted metadata
    async fn asset(&self, address: Address, fallback: &Asset) -> Asset {
        match self.classifier.classify(address).await {
            Ok(asset) => asset,
            Err(e) => {
                trace!("Using request metadata for {}: {}", address, e);
                fallback.clone()
            }
        }
    }
}
