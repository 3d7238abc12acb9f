//! Router configuration
//!
//! Constants live in the `tokens`, `contracts` and `thresholds` submodules;
//! anything deployment-specific is loaded from the environment by
//! [`RouterConfig::from_env`] and handed to the components explicitly.

use alloy::primitives::{Address, B256};
use std::env;
use std::str::FromStr;

use crate::error::{Result, RouterError};
use crate::pools::DiscoveryConfig;

/// Canonical token addresses on Base mainnet
pub mod tokens {
    use alloy::primitives::{address, Address};

    pub const WETH: Address = address!("4200000000000000000000000000000000000006");
    pub const USDC: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
    pub const DAI: Address = address!("50c5725949A6F0c72E6C4a641F24049A917DB0Cb");
    pub const CBBTC: Address = address!("cbB7C0000aB88B473b1f5aFd9ef808440eed33Bf");

    /// Reference assets every input/output is paired against when probing pools
    pub const BASE_TOKENS: [Address; 3] = [WETH, USDC, CBBTC];
}

/// Protocol contract constants
pub mod contracts {
    use alloy::primitives::{b256, B256};

    /// Pool init code hash of the Algebra Integral pool deployer
    pub const POOL_INIT_CODE_HASH: B256 =
        b256!("f96d2474815c32e070cd63233f06af5413efc5dcb430aee4ff18cc29007c562d");
}

pub mod thresholds {
    /// Maximum number of pools in a regular route
    pub const MAX_HOPS: usize = 3;

    /// Default slippage tolerance in bps for displayed bounds
    pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub rpc_url: String,
    pub subgraph_url: String,
    pub chain_id: u64,
    pub pool_deployer: Address,
    pub init_code_hash: B256,
    pub quoter: Address,
    /// Alternate pool deployers, each yielding a distinct pool per pair
    pub custom_deployers: Vec<Address>,
    pub base_tokens: Vec<Address>,
    /// ERC4626 vaults to classify up front so plain assets can find their boosted variant
    pub boosted_vaults: Vec<Address>,
    pub max_hops: usize,
    pub boosted_routing: bool,
}

impl RouterConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            rpc_url: env::var("RPC_URL").unwrap_or_else(|_| "https://mainnet.base.org".to_string()),
            subgraph_url: required("SUBGRAPH_URL")?,
            chain_id: optional_parsed("CHAIN_ID")?.unwrap_or(8453),
            pool_deployer: parse_address("POOL_DEPLOYER", &required("POOL_DEPLOYER")?)?,
            init_code_hash: match env::var("POOL_INIT_CODE_HASH") {
                Ok(raw) => B256::from_str(raw.trim())
                    .map_err(|e| RouterError::Config(format!("POOL_INIT_CODE_HASH: {e}")))?,
                Err(_) => contracts::POOL_INIT_CODE_HASH,
            },
            quoter: parse_address("QUOTER", &required("QUOTER")?)?,
            custom_deployers: address_list("CUSTOM_DEPLOYERS")?,
            base_tokens: match env::var("BASE_TOKENS") {
                Ok(_) => address_list("BASE_TOKENS")?,
                Err(_) => tokens::BASE_TOKENS.to_vec(),
            },
            boosted_vaults: address_list("BOOSTED_VAULTS")?,
            max_hops: optional_parsed("MAX_HOPS")?.unwrap_or(thresholds::MAX_HOPS),
            boosted_routing: optional_parsed("BOOSTED_ROUTING")?.unwrap_or(true),
        })
    }

    pub fn discovery(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            pool_deployer: self.pool_deployer,
            init_code_hash: self.init_code_hash,
            custom_deployers: self.custom_deployers.clone(),
        }
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| RouterError::Config(format!("{key} not set")))
}

fn optional_parsed<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RouterError::Config(format!("invalid {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn parse_address(key: &str, raw: &str) -> Result<Address> {
    Address::from_str(raw.trim()).map_err(|e| RouterError::Config(format!("invalid {key}: {e}")))
}

/// Comma separated address list; unset means empty
fn address_list(key: &str) -> Result<Vec<Address>> {
    let Ok(raw) = env::var(key) else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_address(key, s))
        .collect()
}
