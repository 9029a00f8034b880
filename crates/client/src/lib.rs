//! RPC provider construction for deployment targets.

use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_provider::{Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error connecting to the RPC endpoint
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The endpoint serves a different chain than expected
    #[error("Chain id mismatch: expected {expected}, endpoint reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// A local node exposed no unlocked accounts
    #[error("Node at {0} has no unlocked accounts")]
    NoAccounts(String),
}

/// Create a read-only provider from an RPC url.
///
/// Transactions sent through it are signed by the node, which only works
/// against local development nodes with unlocked accounts.
pub fn create_provider(rpc_url: &str) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider)
}

/// Create a provider with wallet signing capability from a private key.
pub fn create_wallet_provider(
    rpc_url: &str,
    private_key: &str,
) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;

    let signer = parse_signer(private_key)?;
    debug!(deployer = %signer.address(), "Created local signer");

    let wallet = EthereumWallet::from(signer);

    let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

    Ok(provider)
}

/// Address controlled by a private key (hex, with or without `0x`).
pub fn signer_address(private_key: &str) -> Result<Address, ClientError> {
    Ok(parse_signer(private_key)?.address())
}

fn parse_signer(private_key: &str) -> Result<PrivateKeySigner, ClientError> {
    private_key
        .parse()
        .map_err(|e| ClientError::InvalidPrivateKey(format!("{}", e)))
}

/// Fail unless the endpoint reports the expected chain id.
pub async fn ensure_chain_id<P>(provider: &P, expected: u64) -> Result<(), ClientError>
where
    P: Provider,
{
    let actual = provider
        .get_chain_id()
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;

    if actual != expected {
        return Err(ClientError::ChainMismatch { expected, actual });
    }

    Ok(())
}

/// First unlocked account of a local development node.
pub async fn first_unlocked_account<P>(provider: &P, rpc_url: &str) -> Result<Address, ClientError>
where
    P: Provider,
{
    let accounts = provider
        .get_accounts()
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;

    accounts
        .first()
        .copied()
        .ok_or_else(|| ClientError::NoAccounts(rpc_url.to_string()))
}
