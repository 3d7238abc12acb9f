//! Pool state source.
//!
//! The engine treats the indexer as an opaque, possibly stale, possibly
//! failing lookup from pool address to pool state.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Result, RouterError};

/// Normalized pool state as reported by the indexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRecord {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub deployer: Address,
    pub liquidity: u128,
    pub tick: i32,
    pub sqrt_price_x96: U256,
    pub tick_spacing: i32,
}

#[async_trait]
pub trait PoolIndexer: Send + Sync {
    /// Look up pools by address. Unknown addresses are simply absent.
    async fn pools_by_address(&self, addresses: &[Address]) -> Result<Vec<PoolRecord>>;
}

/// In-memory indexer for offline use and tests
#[derive(Debug, Default, Clone)]
pub struct StaticIndexer {
    records: HashMap<Address, PoolRecord>,
    unavailable: bool,
}

impl StaticIndexer {
    pub fn new(records: impl IntoIterator<Item = PoolRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.address, r)).collect(),
            unavailable: false,
        }
    }

    /// An indexer whose every lookup fails
    pub fn unavailable() -> Self {
        Self {
            records: HashMap::new(),
            unavailable: true,
        }
    }
}

#[async_trait]
impl PoolIndexer for StaticIndexer {
    async fn pools_by_address(&self, addresses: &[Address]) -> Result<Vec<PoolRecord>> {
        if self.unavailable {
            return Err(RouterError::IndexerUnavailable("static indexer offline".to_string()));
        }
        Ok(addresses
            .iter()
            .filter_map(|a| self.records.get(a).cloned())
            .collect())
    }
}

const POOLS_QUERY: &str = r#"
query Pools($ids: [ID!]!, $first: Int!) {
  pools(where: { id_in: $ids }, first: $first) {
    id
    token0 { id }
    token1 { id }
    fee
    deployer
    liquidity
    tick
    sqrtPrice
    tickSpacing
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphResponse {
    data: Option<PoolsData>,
    #[serde(default)]
    errors: Vec<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PoolsData {
    pools: Vec<SubgraphPool>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubgraphPool {
    id: String,
    token0: TokenRef,
    token1: TokenRef,
    fee: String,
    #[serde(default)]
    deployer: Option<String>,
    liquidity: String,
    tick: String,
    sqrt_price: String,
    tick_spacing: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct TokenRef {
    id: String,
}

impl SubgraphPool {
    fn into_record(self) -> eyre::Result<PoolRecord> {
        Ok(PoolRecord {
            address: Address::from_str(&self.id)?,
            token0: Address::from_str(&self.token0.id)?,
            token1: Address::from_str(&self.token1.id)?,
            fee: self.fee.parse()?,
            deployer: match self.deployer.as_deref() {
                Some(d) if !d.is_empty() => Address::from_str(d)?,
                _ => Address::ZERO,
            },
            liquidity: self.liquidity.parse()?,
            tick: self.tick.parse()?,
            sqrt_price_x96: U256::from_str(&self.sqrt_price)?,
            tick_spacing: self.tick_spacing.parse()?,
        })
    }
}

/// GraphQL client for the protocol subgraph
pub struct SubgraphIndexer {
    client: reqwest::Client,
    url: String,
}

impl SubgraphIndexer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn query(&self, addresses: &[Address]) -> eyre::Result<Vec<PoolRecord>> {
        let ids: Vec<String> = addresses
            .iter()
            .map(|a| format!("0x{}", hex::encode(a)))
            .collect();

        let body = json!({
            "query": POOLS_QUERY,
            "variables": { "ids": ids, "first": ids.len() },
        });

        let response: GraphResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.errors.first() {
            return Err(eyre::eyre!("subgraph error: {}", err.message));
        }

        let pools = response.data.map(|d| d.pools).unwrap_or_default();
        let mut records = Vec::with_capacity(pools.len());
        for pool in pools {
            let id = pool.id.clone();
            match pool.into_record() {
                Ok(record) => records.push(record),
                Err(e) => debug!("Skipping malformed pool {}: {}", id, e),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl PoolIndexer for SubgraphIndexer {
    async fn pools_by_address(&self, addresses: &[Address]) -> Result<Vec<PoolRecord>> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        self.query(addresses)
            .await
            .map_err(|e| RouterError::IndexerUnavailable(e.to_string()))
    }
}
