use crate::{
    env::EnvSource,
    network::{CustomChain, NetworkProfile, SigningKey, VerificationProfile},
};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// RPC endpoint for Rootstock testnet. Required.
pub const RSK_TESTNET_RPC_URL: &str = "RSK_TESTNET_RPC_URL";
/// RPC endpoint for Rootstock mainnet. Reserved: enables `rskMainnet` when set.
pub const RSK_MAINNET_RPC_URL: &str = "RSK_MAINNET_RPC_URL";
/// Deployer private key. Required.
pub const PRIVATE_KEY: &str = "PRIVATE_KEY";
/// Block-explorer API key. Required.
pub const API_KEY: &str = "API_KEY";

/// Pinned Solidity compiler version the artifacts are expected to come from.
pub const SOLC_VERSION: &str = "0.8.27";

/// Values that must be present for every run, checked in this order.
const REQUIRED: [(&str, &str); 3] = [
    (RSK_TESTNET_RPC_URL, "testnet RPC URL"),
    (PRIVATE_KEY, "private key"),
    (API_KEY, "API key"),
];

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required value is absent or empty
    #[error("The {what} is not configured (set {var})")]
    MissingConfiguration {
        var: &'static str,
        what: &'static str,
    },

    /// A configured URL does not parse
    #[error("Invalid URL in {var}: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    /// A network name not present in the network table
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// A live profile lacks what a deployment needs
    #[error("Network {network} is missing its {missing}")]
    IncompleteProfile {
        network: String,
        missing: &'static str,
    },
}

/// Immutable deployment configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    networks: BTreeMap<String, NetworkProfile>,
    verification: BTreeMap<String, VerificationProfile>,
    custom_chains: Vec<CustomChain>,
    solc_version: String,
}

impl Config {
    /// Validate the environment and build the configuration.
    ///
    /// Fails on the first missing required value, before any profile is built.
    /// The reserved mainnet URL may be absent.
    pub fn load(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let [testnet_var, key_var, api_var] = REQUIRED;
        let testnet_url = require(env, testnet_var)?;
        let private_key = require(env, key_var)?;
        let api_key = require(env, api_var)?;

        validate_url(RSK_TESTNET_RPC_URL, &testnet_url)?;
        let mainnet_url = env.get_non_empty(RSK_MAINNET_RPC_URL);
        if let Some(url) = &mainnet_url {
            validate_url(RSK_MAINNET_RPC_URL, url)?;
        }

        let key = SigningKey::new(private_key);
        let custom_chains = CustomChain::all();

        let mut networks = BTreeMap::new();
        let mut verification = BTreeMap::new();

        let localhost = NetworkProfile::localhost();
        networks.insert(localhost.name.clone(), localhost);

        let testnet = NetworkProfile::rsk_testnet(testnet_url, key.clone());
        let chain = CustomChain::rsk_testnet();
        verification.insert(
            chain.network.clone(),
            VerificationProfile::new(&testnet, &chain, api_key.clone()),
        );
        networks.insert(testnet.name.clone(), testnet);

        match mainnet_url {
            Some(url) => {
                let mainnet = NetworkProfile::rsk_mainnet(url, key);
                let chain = CustomChain::rsk_mainnet();
                verification.insert(
                    chain.network.clone(),
                    VerificationProfile::new(&mainnet, &chain, api_key),
                );
                networks.insert(mainnet.name.clone(), mainnet);
            }
            None => debug!("{RSK_MAINNET_RPC_URL} not set, rskMainnet disabled"),
        }

        Ok(Self {
            networks,
            verification,
            custom_chains,
            solc_version: SOLC_VERSION.to_string(),
        })
    }

    /// Look up a network profile by name.
    pub fn network(&self, name: &str) -> Result<&NetworkProfile, ConfigError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))
    }

    /// All enabled networks, in name order.
    pub const fn networks(&self) -> &BTreeMap<String, NetworkProfile> {
        &self.networks
    }

    /// Verification profiles keyed by explorer network key.
    pub const fn verification(&self) -> &BTreeMap<String, VerificationProfile> {
        &self.verification
    }

    /// Verification profile for a network, matched by name and chain id.
    pub fn verification_for(&self, network_name: &str) -> Option<&VerificationProfile> {
        let network = self.networks.get(network_name)?;
        self.verification
            .values()
            .find(|v| v.network_name == network.name && v.chain_id == network.chain_id)
    }

    /// Statically known explorer chains, including ones whose network is disabled.
    pub fn custom_chains(&self) -> &[CustomChain] {
        &self.custom_chains
    }

    /// Pinned compiler version.
    pub fn solc_version(&self) -> &str {
        &self.solc_version
    }
}

fn require(
    env: &impl EnvSource,
    (var, what): (&'static str, &'static str),
) -> Result<String, ConfigError> {
    env.get_non_empty(var)
        .ok_or(ConfigError::MissingConfiguration { var, what })
}

fn validate_url(var: &'static str, url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidUrl {
            var,
            reason: format!("unsupported scheme {scheme}"),
        }),
    }
}
