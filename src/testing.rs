//! Shared fixtures: Base assets, constant-product pools and a mock quoter
//! that answers every [`StepQuoter`] call from in-memory reserves.

use alloy::primitives::{address, Address, Bytes, U256};
use async_trait::async_trait;
use eyre::eyre;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::assets::{Asset, AssetRegistry};
use crate::config::{contracts::POOL_INIT_CODE_HASH, tokens};
use crate::error::Result;
use crate::graph::AssetGraphBuilder;
use crate::pools::{
    derive_pool_address, u256_to_f64_safe, DiscoveryConfig, Pool, PoolDiscovery, PoolIndexer,
    PoolRecord, StaticIndexer,
};
use crate::quoting::{RouteQuoteEngine, StepQuoter, SwapQuote};
use crate::routing::RouteBuilder;
use crate::trade::Router;

pub const DEPLOYER: Address = address!("00000000000000000000000000000000000000de");

const FEE: u32 = 500;
const FEE_DENOMINATOR: u64 = 1_000_000;
const SWAP_GAS: u64 = 100_000;

pub fn usdc() -> Asset {
    Asset::new(tokens::USDC, 6, "USDC")
}

pub fn weth() -> Asset {
    Asset::new(tokens::WETH, 18, "WETH")
}

pub fn cbbtc() -> Asset {
    Asset::new(tokens::CBBTC, 8, "cbBTC")
}

pub fn dai() -> Asset {
    Asset::new(tokens::DAI, 18, "DAI")
}

pub fn v_usdc() -> Asset {
    Asset::boosted(Address::repeat_byte(0xa1), 6, "vUSDC", usdc())
}

pub fn v_weth() -> Asset {
    Asset::boosted(Address::repeat_byte(0xa2), 18, "vWETH", weth())
}

pub fn v_cbbtc() -> Asset {
    Asset::boosted(Address::repeat_byte(0xa3), 8, "vcbBTC", cbbtc())
}

pub fn registry() -> AssetRegistry {
    AssetRegistry::new([usdc(), weth(), cbbtc(), dai(), v_usdc(), v_weth(), v_cbbtc()])
}

/// sqrt(reserve1 / reserve0) in Q64.96
fn sqrt_price_x96(reserve0: U256, reserve1: U256) -> U256 {
    if reserve0.is_zero() || reserve1.is_zero() {
        return U256::ZERO;
    }
    let ratio = u256_to_f64_safe(reserve1) / u256_to_f64_safe(reserve0);
    let scaled = ratio.sqrt() * 2_f64.powi(48);
    U256::from(scaled as u128) << 48
}

/// Pool at `0x{tag}{tag}..` pricing `a` against `b` at the reserve ratio
pub fn pool(tag: u8, a: Asset, b: Asset, reserve_a: u128, reserve_b: u128) -> Pool {
    pool_at(Address::repeat_byte(tag), a, b, reserve_a, reserve_b)
}

pub fn pool_at(address: Address, a: Asset, b: Asset, reserve_a: u128, reserve_b: u128) -> Pool {
    let (r0, r1) = if a.sorts_before(&b) {
        (reserve_a, reserve_b)
    } else {
        (reserve_b, reserve_a)
    };
    let liquidity = ((r0 as f64) * (r1 as f64)).sqrt().max(1.0) as u128;
    Pool::new(
        address,
        a,
        b,
        FEE,
        Address::ZERO,
        liquidity,
        0,
        sqrt_price_x96(U256::from(r0), U256::from(r1)),
        60,
    )
}

fn record(pool: &Pool) -> PoolRecord {
    PoolRecord {
        address: pool.address,
        token0: pool.token0.address,
        token1: pool.token1.address,
        fee: pool.fee,
        deployer: pool.deployer,
        liquidity: pool.liquidity,
        tick: pool.tick,
        sqrt_price_x96: pool.sqrt_price_x96,
        tick_spacing: pool.tick_spacing,
    }
}

#[derive(Debug, Clone, Copy)]
struct Reserves {
    pool: Address,
    reserve0: U256,
    reserve1: U256,
}

#[derive(Debug, Default)]
struct MockState {
    /// (token0, token1, deployer) -> reserves
    pools: HashMap<(Address, Address, Address), Reserves>,
    /// vault -> shares per asset as num / den
    vaults: HashMap<Address, (u64, u64)>,
    failing: HashSet<Address>,
    fail_all: bool,
    delay: Option<Duration>,
}

/// Constant-product quoter with fixed-rate vaults.
///
/// Exact-output amounts round up so feeding them forward always reaches the
/// requested amount.
#[derive(Debug, Clone)]
pub struct MockQuoter {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockQuoter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockQuoter {
    pub fn new() -> Self {
        let mut state = MockState::default();
        state.vaults.insert(v_usdc().address, (95, 100));
        state.vaults.insert(v_weth().address, (9, 10));
        state.vaults.insert(v_cbbtc().address, (1, 1));
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn set_reserves(&self, pool: &Pool, reserve0: u128, reserve1: u128) {
        self.state.lock().pools.insert(
            (pool.token0.address, pool.token1.address, pool.deployer),
            Reserves {
                pool: pool.address,
                reserve0: U256::from(reserve0),
                reserve1: U256::from(reserve1),
            },
        );
    }

    pub fn fail_pool(&self, pool: &Pool) {
        self.state.lock().failing.insert(pool.address);
    }

    pub fn fail_all(&self) {
        self.state.lock().fail_all = true;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().delay = Some(delay);
    }

    async fn pause(&self) -> eyre::Result<()> {
        let (delay, fail_all) = {
            let state = self.state.lock();
            (state.delay, state.fail_all)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail_all {
            return Err(eyre!("execution reverted"));
        }
        Ok(())
    }

    fn vault_rate(&self, vault: Address) -> eyre::Result<(U256, U256)> {
        let (num, den) = self
            .state
            .lock()
            .vaults
            .get(&vault)
            .copied()
            .ok_or_else(|| eyre!("unknown vault {}", vault))?;
        Ok((U256::from(num), U256::from(den)))
    }

    /// Reserves for `token_in -> token_out` as (reserve_in, reserve_out)
    fn reserves(
        &self,
        token_in: Address,
        deployer: Address,
        token_out: Address,
    ) -> eyre::Result<(U256, U256)> {
        let state = self.state.lock();
        let (key, in_is_zero) = if token_in < token_out {
            ((token_in, token_out, deployer), true)
        } else {
            ((token_out, token_in, deployer), false)
        };
        let reserves = state
            .pools
            .get(&key)
            .ok_or_else(|| eyre!("no pool for {} -> {}", token_in, token_out))?;
        if state.failing.contains(&reserves.pool) {
            return Err(eyre!("execution reverted: pool {}", reserves.pool));
        }
        Ok(if in_is_zero {
            (reserves.reserve0, reserves.reserve1)
        } else {
            (reserves.reserve1, reserves.reserve0)
        })
    }

    fn swap_quote(
        token_in: Address,
        token_out: Address,
        reserve_in: U256,
        reserve_out: U256,
        amount_in: U256,
        amount_out: U256,
    ) -> SwapQuote {
        let new_in = reserve_in + amount_in;
        let new_out = reserve_out - amount_out;
        let sqrt_price_after = if token_in < token_out {
            sqrt_price_x96(new_in, new_out)
        } else {
            sqrt_price_x96(new_out, new_in)
        };
        SwapQuote {
            amount_in,
            amount_out,
            sqrt_price_after,
            ticks_crossed: 1,
            gas_estimate: SWAP_GAS,
            fee: FEE,
        }
    }
}

fn decode_path(path: &Bytes) -> eyre::Result<(Address, Address, Address)> {
    if path.len() != 60 {
        return Err(eyre!("bad path length {}", path.len()));
    }
    Ok((
        Address::from_slice(&path[..20]),
        Address::from_slice(&path[20..40]),
        Address::from_slice(&path[40..]),
    ))
}

#[async_trait]
impl StepQuoter for MockQuoter {
    async fn preview_deposit(&self, vault: Address, assets: U256) -> eyre::Result<U256> {
        self.pause().await?;
        let (num, den) = self.vault_rate(vault)?;
        Ok(assets * num / den)
    }

    async fn preview_mint(&self, vault: Address, shares: U256) -> eyre::Result<U256> {
        self.pause().await?;
        let (num, den) = self.vault_rate(vault)?;
        Ok((shares * den).div_ceil(num))
    }

    async fn preview_redeem(&self, vault: Address, shares: U256) -> eyre::Result<U256> {
        self.pause().await?;
        let (num, den) = self.vault_rate(vault)?;
        Ok(shares * den / num)
    }

    async fn preview_withdraw(&self, vault: Address, assets: U256) -> eyre::Result<U256> {
        self.pause().await?;
        let (num, den) = self.vault_rate(vault)?;
        Ok((assets * num).div_ceil(den))
    }

    async fn quote_exact_input(&self, path: Bytes, amount_in: U256) -> eyre::Result<SwapQuote> {
        self.pause().await?;
        let (token_in, deployer, token_out) = decode_path(&path)?;
        let (reserve_in, reserve_out) = self.reserves(token_in, deployer, token_out)?;

        let fee_den = U256::from(FEE_DENOMINATOR);
        let after_fee = amount_in * U256::from(FEE_DENOMINATOR - FEE as u64) / fee_den;
        let amount_out = reserve_out * after_fee / (reserve_in + after_fee);
        Ok(Self::swap_quote(token_in, token_out, reserve_in, reserve_out, amount_in, amount_out))
    }

    async fn quote_exact_output(&self, path: Bytes, amount_out: U256) -> eyre::Result<SwapQuote> {
        self.pause().await?;
        let (token_out, deployer, token_in) = decode_path(&path)?;
        let (reserve_in, reserve_out) = self.reserves(token_in, deployer, token_out)?;
        if amount_out >= reserve_out {
            return Err(eyre!("insufficient liquidity"));
        }

        let after_fee = (reserve_in * amount_out).div_ceil(reserve_out - amount_out);
        let amount_in = (after_fee * U256::from(FEE_DENOMINATOR))
            .div_ceil(U256::from(FEE_DENOMINATOR - FEE as u64));
        Ok(Self::swap_quote(token_in, token_out, reserve_in, reserve_out, amount_in, amount_out))
    }
}

/// Indexer wrapper that counts lookups
#[derive(Debug, Clone)]
pub struct CountingIndexer {
    inner: StaticIndexer,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PoolIndexer for CountingIndexer {
    async fn pools_by_address(&self, addresses: &[Address]) -> Result<Vec<PoolRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.pools_by_address(addresses).await
    }
}

/// A set of pools and the quoter that prices them
#[derive(Debug, Clone, Default)]
pub struct Market {
    pub quoter: MockQuoter,
    pub pools: Vec<Arc<Pool>>,
}

impl Market {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pool(
        &mut self,
        tag: u8,
        a: Asset,
        b: Asset,
        reserve_a: u128,
        reserve_b: u128,
    ) -> Arc<Pool> {
        let a_is_zero = a.sorts_before(&b);
        self.insert(pool(tag, a, b, reserve_a, reserve_b), a_is_zero, reserve_a, reserve_b)
    }

    /// Pool at the address discovery derives for `a`/`b`
    pub fn list_pool(
        &mut self,
        a: Asset,
        b: Asset,
        reserve_a: u128,
        reserve_b: u128,
    ) -> Arc<Pool> {
        let address =
            derive_pool_address(DEPLOYER, POOL_INIT_CODE_HASH, a.address, b.address, None);
        let a_is_zero = a.sorts_before(&b);
        self.insert(pool_at(address, a, b, reserve_a, reserve_b), a_is_zero, reserve_a, reserve_b)
    }

    fn insert(
        &mut self,
        pool: Pool,
        a_is_zero: bool,
        reserve_a: u128,
        reserve_b: u128,
    ) -> Arc<Pool> {
        let (reserve0, reserve1) = if a_is_zero {
            (reserve_a, reserve_b)
        } else {
            (reserve_b, reserve_a)
        };
        self.quoter.set_reserves(&pool, reserve0, reserve1);
        let pool = Arc::new(pool);
        self.pools.push(pool.clone());
        pool
    }

    pub fn engine(&self) -> RouteQuoteEngine {
        RouteQuoteEngine::new(Arc::new(self.quoter.clone()))
    }

    pub fn indexer(&self) -> StaticIndexer {
        StaticIndexer::new(self.pools.iter().map(|p| record(p)))
    }

    pub fn router(&self) -> Router {
        self.router_with(Arc::new(self.indexer()))
    }

    pub fn counting_router(&self) -> (Router, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let indexer = CountingIndexer {
            inner: self.indexer(),
            calls: calls.clone(),
        };
        (self.router_with(Arc::new(indexer)), calls)
    }

    /// Router whose indexer is down
    pub fn offline_router(&self) -> Router {
        self.router_with(Arc::new(StaticIndexer::unavailable()))
    }

    fn router_with(&self, indexer: Arc<dyn PoolIndexer>) -> Router {
        let classifier = Arc::new(registry());
        let discovery = PoolDiscovery::new(
            DiscoveryConfig {
                pool_deployer: DEPLOYER,
                init_code_hash: POOL_INIT_CODE_HASH,
                custom_deployers: Vec::new(),
            },
            indexer,
            classifier.clone(),
        );
        Router::new(
            AssetGraphBuilder::new(vec![weth(), usdc(), cbbtc()], classifier),
            discovery,
            RouteBuilder::default(),
            self.engine(),
        )
    }
}
