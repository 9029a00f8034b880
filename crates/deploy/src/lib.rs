//! Network-bound execution of deployment modules.
//!
//! - [`artifact`]: compiled contract artifacts and constructor encoding
//! - [`context`]: a [`module::DeploymentContext`] backed by an alloy provider
//! - [`journal`]: per-network record of completed module runs

pub mod artifact;
pub mod context;
pub mod journal;

pub use artifact::{Artifact, ArtifactError, ArtifactStore, BuildInfo};
pub use context::ChainContext;
pub use journal::{Journal, JournalEntry, JournalError};
