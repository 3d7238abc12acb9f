//! Asset classification
//!
//! Turns raw token addresses into [`Asset`] values, detecting ERC4626 vaults
//! so their underlying asset is attached at construction.

use alloy::primitives::Address;
use alloy::providers::Provider;
use alloy::sol;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::{debug, trace};

use super::Asset;
use crate::error::{Result, RouterError};

sol! {
    #[sol(rpc)]
    interface IERC20Metadata {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}

sol! {
    #[sol(rpc)]
    interface IERC4626Asset {
        function asset() external view returns (address);
    }
}

#[async_trait]
pub trait AssetClassifier: Send + Sync {
    async fn classify(&self, address: Address) -> Result<Asset>;

    /// Boosted vault registered for `underlying`, if one is known
    fn boosted_variant(&self, underlying: &Asset) -> Option<Asset>;

    /// The asset on the other side of a wrap/unwrap edge
    fn counterpart(&self, asset: &Asset) -> Option<Asset> {
        match asset.underlying() {
            Some(underlying) => Some(underlying.clone()),
            None => self.boosted_variant(asset),
        }
    }
}

/// Fixed, in-memory set of known assets
#[derive(Debug, Default, Clone)]
pub struct AssetRegistry {
    assets: HashMap<Address, Asset>,
    boosted_by_underlying: HashMap<Address, Address>,
}

impl AssetRegistry {
    pub fn new(assets: impl IntoIterator<Item = Asset>) -> Self {
        let mut registry = Self::default();
        for asset in assets {
            registry.insert(asset);
        }
        registry
    }

    pub fn insert(&mut self, asset: Asset) {
        if let Some(underlying) = asset.underlying() {
            self.boosted_by_underlying
                .entry(underlying.address)
                .or_insert(asset.address);
            self.assets
                .entry(underlying.address)
                .or_insert_with(|| underlying.clone());
        }
        self.assets.insert(asset.address, asset);
    }

    pub fn get(&self, address: Address) -> Option<&Asset> {
        self.assets.get(&address)
    }
}

#[async_trait]
impl AssetClassifier for AssetRegistry {
    async fn classify(&self, address: Address) -> Result<Asset> {
        self.get(address)
            .cloned()
            .ok_or_else(|| RouterError::Classification {
                address,
                reason: "unknown asset".to_string(),
            })
    }

    fn boosted_variant(&self, underlying: &Asset) -> Option<Asset> {
        self.boosted_by_underlying
            .get(&underlying.address)
            .and_then(|vault| self.assets.get(vault))
            .cloned()
    }
}

/// Classifies tokens by reading ERC20 metadata and probing `asset()`.
///
/// Results are cached for the lifetime of the classifier.
pub struct OnchainClassifier<P> {
    provider: P,
    cache: DashMap<Address, Asset>,
    boosted_by_underlying: DashMap<Address, Address>,
}

impl<P: Provider + Clone + Send + Sync + 'static> OnchainClassifier<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: DashMap::new(),
            boosted_by_underlying: DashMap::new(),
        }
    }

    /// Classify a list of known vaults so their underlyings can find them
    pub async fn preload(&self, vaults: &[Address]) -> Result<()> {
        for &vault in vaults {
            let asset = self.classify(vault).await?;
            if !asset.is_boosted() {
                debug!("Configured vault {} has no underlying asset", vault);
            }
        }
        Ok(())
    }

    async fn fetch_metadata(&self, address: Address) -> Result<(u8, String)> {
        let token = IERC20Metadata::new(address, &self.provider);
        let decimals = token
            .decimals()
            .call()
            .await
            .map_err(|e| RouterError::Classification {
                address,
                reason: e.to_string(),
            })?;
        // Some tokens return bytes32 symbols; fall back to the address
        let symbol = token
            .symbol()
            .call()
            .await
            .unwrap_or_else(|_| address.to_string());
        Ok((decimals, symbol))
    }

    async fn plain(&self, address: Address) -> Result<Asset> {
        if let Some(cached) = self.cache.get(&address) {
            return Ok(cached.clone());
        }
        let (decimals, symbol) = self.fetch_metadata(address).await?;
        let asset = Asset::new(address, decimals, symbol);
        self.cache.insert(address, asset.clone());
        Ok(asset)
    }
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> AssetClassifier for OnchainClassifier<P> {
    async fn classify(&self, address: Address) -> Result<Asset> {
        if let Some(cached) = self.cache.get(&address) {
            return Ok(cached.clone());
        }

        let (decimals, symbol) = self.fetch_metadata(address).await?;

        // Anything that is not an ERC4626 vault reverts on asset()
        let vault = IERC4626Asset::new(address, &self.provider);
        let asset = match vault.asset().call().await {
            Ok(underlying) if underlying != Address::ZERO && underlying != address => {
                let underlying = self.plain(underlying).await?;
                self.boosted_by_underlying
                    .entry(underlying.address)
                    .or_insert(address);
                trace!("Classified {} as vault over {}", symbol, underlying);
                Asset::boosted(address, decimals, symbol, underlying)
            }
            _ => Asset::new(address, decimals, symbol),
        };

        self.cache.insert(address, asset.clone());
        Ok(asset)
    }

    fn boosted_variant(&self, underlying: &Asset) -> Option<Asset> {
        let vault = *self.boosted_by_underlying.get(&underlying.address)?;
        self.cache.get(&vault).map(|entry| entry.clone())
    }
}
