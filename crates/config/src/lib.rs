//! Deployment configuration for Rootstock networks.
//!
//! This crate provides:
//! - Environment sources (process environment with `.env`, or an in-memory map)
//! - Validation of required and reserved values
//! - The static network table and block-explorer verification profiles

pub mod env;
pub mod network;

mod loader;

pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use loader::{
    Config, ConfigError, API_KEY, PRIVATE_KEY, RSK_MAINNET_RPC_URL, RSK_TESTNET_RPC_URL,
};
pub use network::{CustomChain, NetworkProfile, SigningKey, VerificationProfile};
