//! Deterministic pool address derivation.
//!
//! Mirrors the pool deployer's CREATE2 scheme: the salt is the hash of the
//! ABI-encoded sorted token pair, prefixed with the custom deployer when the
//! pool was not created through the default path.

use alloy::primitives::{keccak256, Address, B256};
use alloy::sol_types::SolValue;

pub fn pool_salt(token_a: Address, token_b: Address, custom_deployer: Option<Address>) -> B256 {
    let (token0, token1) = if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    };

    match custom_deployer.filter(|d| *d != Address::ZERO) {
        Some(deployer) => keccak256((deployer, token0, token1).abi_encode()),
        None => keccak256((token0, token1).abi_encode()),
    }
}

pub fn derive_pool_address(
    pool_deployer: Address,
    init_code_hash: B256,
    token_a: Address,
    token_b: Address,
    custom_deployer: Option<Address>,
) -> Address {
    let salt = pool_salt(token_a, token_b, custom_deployer);
    pool_deployer.create2(salt, init_code_hash)
}
