pub mod classifier;

pub use classifier::{AssetClassifier, AssetRegistry, OnchainClassifier};

use alloy::primitives::Address;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A token the router can move through.
///
/// Boosted assets are ERC4626 vault shares; `underlying` is the asset they
/// redeem into. Identity is the address alone.
#[derive(Debug, Clone)]
pub struct Asset {
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    underlying: Option<Arc<Asset>>,
}

impl Asset {
    pub fn new(address: Address, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            address,
            decimals,
            symbol: symbol.into(),
            underlying: None,
        }
    }

    /// Vault share token wrapping `underlying`
    pub fn boosted(
        address: Address,
        decimals: u8,
        symbol: impl Into<String>,
        underlying: Asset,
    ) -> Self {
        Self {
            address,
            decimals,
            symbol: symbol.into(),
            underlying: Some(Arc::new(underlying)),
        }
    }

    pub fn underlying(&self) -> Option<&Asset> {
        self.underlying.as_deref()
    }

    pub fn is_boosted(&self) -> bool {
        self.underlying.is_some()
    }

    /// True if `self` is the vault whose underlying is `other`
    pub fn wraps(&self, other: &Asset) -> bool {
        self.underlying().is_some_and(|u| u == other)
    }

    /// Canonical pool ordering: lower address is token0
    pub fn sorts_before(&self, other: &Asset) -> bool {
        self.address < other.address
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Asset {}

impl Hash for Asset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
