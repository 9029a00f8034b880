//! Network profiles and block-explorer verification endpoints.
//!
//! Chain parameters are static; only endpoints and credentials come from the
//! environment.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed legacy gas price (wei) used on both Rootstock networks.
pub const RSK_GAS_PRICE: u128 = 60_000_000;

/// Rootstock mainnet chain id.
pub const RSK_MAINNET_CHAIN_ID: u64 = 30;

/// Rootstock testnet chain id.
pub const RSK_TESTNET_CHAIN_ID: u64 = 31;

/// Chain id of a local development node.
pub const LOCALHOST_CHAIN_ID: u64 = 31337;

/// RPC endpoint of a local development node.
pub const LOCALHOST_RPC_URL: &str = "http://127.0.0.1:8545";

/// Private key used to sign deployment transactions.
///
/// `Debug` and `Display` never print the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key material. Only pass this to a signer.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

impl fmt::Display for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// A deployment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    /// Unique network name (e.g. `rskTestnet`)
    pub name: String,
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Chain ID
    pub chain_id: u64,
    /// Fixed legacy gas price in wei, if the network pins one
    pub gas_price: Option<u128>,
    /// Deployer key; local nodes use their unlocked accounts instead
    pub signing_key: Option<SigningKey>,
    /// Whether this is a local development node
    pub local: bool,
}

impl NetworkProfile {
    /// Local development node profile.
    pub fn localhost() -> Self {
        Self {
            name: "localhost".to_string(),
            rpc_url: LOCALHOST_RPC_URL.to_string(),
            chain_id: LOCALHOST_CHAIN_ID,
            gas_price: None,
            signing_key: None,
            local: true,
        }
    }

    /// Rootstock testnet profile.
    pub fn rsk_testnet(rpc_url: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            name: "rskTestnet".to_string(),
            rpc_url: rpc_url.into(),
            chain_id: RSK_TESTNET_CHAIN_ID,
            gas_price: Some(RSK_GAS_PRICE),
            signing_key: Some(signing_key),
            local: false,
        }
    }

    /// Rootstock mainnet profile.
    pub fn rsk_mainnet(rpc_url: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            name: "rskMainnet".to_string(),
            rpc_url: rpc_url.into(),
            chain_id: RSK_MAINNET_CHAIN_ID,
            gas_price: Some(RSK_GAS_PRICE),
            signing_key: Some(signing_key),
            local: false,
        }
    }

    /// Check that a live (non-local) profile has an endpoint and a signing key.
    pub fn ensure_live_ready(&self) -> Result<(), ConfigError> {
        if self.local {
            return Ok(());
        }
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::IncompleteProfile {
                network: self.name.clone(),
                missing: "rpc endpoint",
            });
        }
        match &self.signing_key {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(ConfigError::IncompleteProfile {
                network: self.name.clone(),
                missing: "signing key",
            }),
        }
    }
}

/// Block-explorer endpoints for a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomChain {
    /// Explorer-side network key (e.g. `rsktestnet`)
    pub network: String,
    /// Chain ID
    pub chain_id: u64,
    /// Etherscan-compatible API base url
    pub api_url: String,
    /// Human-facing explorer url
    pub browser_url: String,
}

impl CustomChain {
    /// Blockscout instance for Rootstock testnet.
    pub fn rsk_testnet() -> Self {
        Self {
            network: "rsktestnet".to_string(),
            chain_id: RSK_TESTNET_CHAIN_ID,
            api_url: "https://rootstock-testnet.blockscout.com/api/".to_string(),
            browser_url: "https://rootstock-testnet.blockscout.com/".to_string(),
        }
    }

    /// Blockscout instance for Rootstock mainnet.
    pub fn rsk_mainnet() -> Self {
        Self {
            network: "rskmainnet".to_string(),
            chain_id: RSK_MAINNET_CHAIN_ID,
            api_url: "https://rootstock.blockscout.com/api/".to_string(),
            browser_url: "https://rootstock.blockscout.com/".to_string(),
        }
    }

    /// All statically known explorer chains.
    pub fn all() -> Vec<Self> {
        vec![Self::rsk_testnet(), Self::rsk_mainnet()]
    }
}

/// Credentials and endpoints for verifying contracts deployed to a network.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationProfile {
    /// Name of the [`NetworkProfile`] this profile verifies on
    pub network_name: String,
    /// Must match the network profile's chain id
    pub chain_id: u64,
    pub api_url: String,
    pub explorer_url: String,
    /// Opaque, non-empty. Blockscout accepts any value.
    pub api_key: String,
}

impl VerificationProfile {
    pub fn new(network: &NetworkProfile, chain: &CustomChain, api_key: impl Into<String>) -> Self {
        Self {
            network_name: network.name.clone(),
            chain_id: chain.chain_id,
            api_url: chain.api_url.clone(),
            explorer_url: chain.browser_url.clone(),
            api_key: api_key.into(),
        }
    }

    /// Explorer page for a deployed address.
    pub fn address_url(&self, address: impl fmt::Display) -> String {
        format!("{}address/{}", self.explorer_url, address)
    }
}

impl fmt::Debug for VerificationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationProfile")
            .field("network_name", &self.network_name)
            .field("chain_id", &self.chain_id)
            .field("api_url", &self.api_url)
            .field("explorer_url", &self.explorer_url)
            .finish_non_exhaustive()
    }
}
