//! Chain-backed [`StepQuoter`] using the protocol QuoterV2 and ERC4626 previews.

use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::sol;
use async_trait::async_trait;
use eyre::{eyre, Result};

use super::step::{StepQuoter, SwapQuote};

// Algebra Integral QuoterV2 (path-based, custom deployer aware)
sol! {
    #[sol(rpc)]
    interface IAlgebraQuoterV2 {
        function quoteExactInput(bytes memory path, uint256 amountInRequired)
            external
            returns (
                uint256[] memory amountOutList,
                uint256[] memory amountInList,
                uint160[] memory sqrtPriceX96AfterList,
                uint32[] memory initializedTicksCrossedList,
                uint256 gasEstimate,
                uint16[] memory feeList
            );

        function quoteExactOutput(bytes memory path, uint256 amountOutRequired)
            external
            returns (
                uint256[] memory amountOutList,
                uint256[] memory amountInList,
                uint160[] memory sqrtPriceX96AfterList,
                uint32[] memory initializedTicksCrossedList,
                uint256 gasEstimate,
                uint16[] memory feeList
            );
    }
}

sol! {
    #[sol(rpc)]
    interface IERC4626 {
        function previewDeposit(uint256 assets) external view returns (uint256);
        function previewMint(uint256 shares) external view returns (uint256);
        function previewRedeem(uint256 shares) external view returns (uint256);
        function previewWithdraw(uint256 assets) external view returns (uint256);
    }
}

pub struct OnchainQuoter<P> {
    provider: P,
    quoter: Address,
}

impl<P: Provider + Clone + Send + Sync + 'static> OnchainQuoter<P> {
    pub fn new(provider: P, quoter: Address) -> Self {
        Self { provider, quoter }
    }
}

/// Pull the single-pool entry out of the quoter's per-hop lists
fn single_hop(
    amount_out: &[U256],
    amount_in: &[U256],
    sqrt_price_after: &[alloy::primitives::aliases::U160],
    ticks_crossed: &[u32],
    gas_estimate: U256,
    fees: &[u16],
) -> Result<SwapQuote> {
    Ok(SwapQuote {
        amount_out: *amount_out.first().ok_or_else(|| eyre!("empty amountOutList"))?,
        amount_in: *amount_in.first().ok_or_else(|| eyre!("empty amountInList"))?,
        sqrt_price_after: sqrt_price_after
            .first()
            .map(|p| U256::from(*p))
            .ok_or_else(|| eyre!("empty sqrtPriceX96AfterList"))?,
        ticks_crossed: ticks_crossed.first().copied().unwrap_or_default(),
        gas_estimate: gas_estimate.saturating_to::<u64>(),
        fee: fees.first().copied().map(u32::from).unwrap_or_default(),
    })
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> StepQuoter for OnchainQuoter<P> {
    async fn preview_deposit(&self, vault: Address, assets: U256) -> Result<U256> {
        let vault = IERC4626::new(vault, &self.provider);
        Ok(vault.previewDeposit(assets).call().await?)
    }

    async fn preview_mint(&self, vault: Address, shares: U256) -> Result<U256> {
        let vault = IERC4626::new(vault, &self.provider);
        Ok(vault.previewMint(shares).call().await?)
    }

    async fn preview_redeem(&self, vault: Address, shares: U256) -> Result<U256> {
        let vault = IERC4626::new(vault, &self.provider);
        Ok(vault.previewRedeem(shares).call().await?)
    }

    async fn preview_withdraw(&self, vault: Address, assets: U256) -> Result<U256> {
        let vault = IERC4626::new(vault, &self.provider);
        Ok(vault.previewWithdraw(assets).call().await?)
    }

    async fn quote_exact_input(&self, path: Bytes, amount_in: U256) -> Result<SwapQuote> {
        let quoter = IAlgebraQuoterV2::new(self.quoter, &self.provider);
        // Use call() to simulate without state change
        let result = quoter.quoteExactInput(path, amount_in).call().await?;
        single_hop(
            &result.amountOutList,
            &result.amountInList,
            &result.sqrtPriceX96AfterList,
            &result.initializedTicksCrossedList,
            result.gasEstimate,
            &result.feeList,
        )
    }

    async fn quote_exact_output(&self, path: Bytes, amount_out: U256) -> Result<SwapQuote> {
        let quoter = IAlgebraQuoterV2::new(self.quoter, &self.provider);
        let result = quoter.quoteExactOutput(path, amount_out).call().await?;
        single_hop(
            &result.amountOutList,
            &result.amountInList,
            &result.sqrtPriceX96AfterList,
            &result.initializedTicksCrossedList,
            result.gasEstimate,
            &result.feeList,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::aliases::U160;

    #[test]
    fn test_single_hop_extraction() {
        let quote = single_hop(
            &[U256::from(90u8)],
            &[U256::from(100u8)],
            &[U160::from(42u8)],
            &[3],
            U256::from(120_000u64),
            &[500],
        )
        .unwrap();
        assert_eq!(quote.amount_in, U256::from(100u8));
        assert_eq!(quote.amount_out, U256::from(90u8));
        assert_eq!(quote.sqrt_price_after, U256::from(42u8));
        assert_eq!(quote.ticks_crossed, 3);
        assert_eq!(quote.fee, 500);
        assert_eq!(quote.gas_estimate, 120_000);
    }

    #[test]
    fn test_empty_lists_rejected() {
        assert!(single_hop(&[], &[], &[], &[], U256::ZERO, &[]).is_err());
    }
}
