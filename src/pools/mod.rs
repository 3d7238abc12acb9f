pub mod address;
pub mod discovery;
pub mod indexer;

pub use address::{derive_pool_address, pool_salt};
pub use discovery::{DiscoveryConfig, PoolDiscovery};
pub use indexer::{PoolIndexer, PoolRecord, StaticIndexer, SubgraphIndexer};

use alloy::primitives::{Address, U256};

use crate::assets::Asset;

/// Immutable snapshot of a concentrated-liquidity pool
#[derive(Debug, Clone)]
pub struct Pool {
    pub address: Address,
    pub token0: Asset,
    pub token1: Asset,
    pub fee: u32,           // Fee in hundredths of bip
    pub deployer: Address,  // Address::ZERO for the default deployer
    pub liquidity: u128,
    pub tick: i32,
    pub sqrt_price_x96: U256,
    pub tick_spacing: i32,
}

impl Pool {
    /// Build a pool, putting the tokens in canonical order
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: Address,
        token_a: Asset,
        token_b: Asset,
        fee: u32,
        deployer: Address,
        liquidity: u128,
        tick: i32,
        sqrt_price_x96: U256,
        tick_spacing: i32,
    ) -> Self {
        let (token0, token1) = if token_a.sorts_before(&token_b) {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Self {
            address,
            token0,
            token1,
            fee,
            deployer,
            liquidity,
            tick,
            sqrt_price_x96,
            tick_spacing,
        }
    }

    pub fn involves(&self, token: &Asset) -> bool {
        self.token0 == *token || self.token1 == *token
    }

    /// The opposite side of the pool from `token`
    pub fn other(&self, token: &Asset) -> Option<&Asset> {
        if self.token0 == *token {
            Some(&self.token1)
        } else if self.token1 == *token {
            Some(&self.token0)
        } else {
            None
        }
    }

    pub fn zero_for_one(&self, token_in: &Asset) -> bool {
        self.token0 == *token_in
    }

    /// Both sides boosted or both sides plain
    pub fn is_same_class(&self) -> bool {
        self.token0.is_boosted() == self.token1.is_boosted()
    }

    pub fn is_custom(&self) -> bool {
        self.deployer != Address::ZERO
    }
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.token0, self.token1)?;
        if self.is_custom() {
            write!(f, " ({})", self.deployer)?;
        }
        Ok(())
    }
}

/// (sqrtPriceX96 / 2^96)^2
pub fn sqrt_price_to_raw_price(sqrt_price_x96: U256) -> f64 {
    if sqrt_price_x96.is_zero() {
        return 0.0;
    }
    let sqrt_price = u256_to_f64_safe(sqrt_price_x96) / 2_f64.powi(96);
    sqrt_price * sqrt_price
}

/// Convert U256 to f64, handling values larger than u128::MAX
pub fn u256_to_f64_safe(value: U256) -> f64 {
    if value.is_zero() {
        return 0.0;
    }

    if value <= U256::from(u128::MAX) {
        return value.to::<u128>() as f64;
    }

    // Keep the most significant 64 bits and scale back up
    let bits = 256 - value.leading_zeros();
    let shift = bits.saturating_sub(64);
    let mantissa = (value >> shift).to::<u64>() as f64;
    mantissa * 2_f64.powi(shift as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pool, usdc, v_usdc, v_weth, weth};

    #[test]
    fn test_canonical_order() {
        let p = pool(0x01, weth(), usdc(), 1_000_000, 2_000_000);
        assert!(p.token0.address < p.token1.address);
        assert_eq!(p.other(&usdc()), Some(&weth()));
        assert_eq!(p.other(&v_usdc()), None);
    }

    #[test]
    fn test_same_class() {
        assert!(pool(0x01, weth(), usdc(), 1, 1).is_same_class());
        assert!(pool(0x02, v_weth(), v_usdc(), 1, 1).is_same_class());
        assert!(!pool(0x03, v_weth(), usdc(), 1, 1).is_same_class());
    }

    #[test]
    fn test_price_at_parity() {
        let q96 = U256::from(1u8) << 96;
        assert!((sqrt_price_to_raw_price(q96) - 1.0).abs() < 1e-12);
        assert_eq!(sqrt_price_to_raw_price(U256::ZERO), 0.0);
    }

    #[test]
    fn test_u256_to_f64_large() {
        let big = U256::from(1u8) << 200;
        let f = u256_to_f64_safe(big);
        assert!((f / 2_f64.powi(200) - 1.0).abs() < 1e-12);
    }
}
