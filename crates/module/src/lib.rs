//! Deployment modules: named, declarative units that each instantiate one contract.
//!
//! A module is plain data ([`DeploymentUnit`]). [`execute`] interprets it
//! against any [`DeploymentContext`], so the same descriptor runs on a live
//! network, a local node or a test double.

pub mod registry;
pub mod unit;

pub use registry::{ModuleError, Registry};
pub use unit::DeploymentUnit;

use alloy_primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, future::Future};
use tracing::{debug, info};

/// Handle to a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractHandle {
    /// Contract name as compiled
    pub contract_name: String,
    /// Deployed address
    pub address: Address,
    /// ABI reference, `<sourceName>:<contractName>`
    pub artifact_id: String,
    /// Creation transaction, when known
    pub tx_hash: Option<TxHash>,
}

/// A network-bound execution context that can instantiate contracts.
pub trait DeploymentContext: Send + Sync {
    /// Name of the network this context deploys to.
    fn network(&self) -> &str;

    /// Instantiate `contract_name` with the given constructor arguments.
    ///
    /// Failures (insufficient funds, reverts, timeouts) are fatal to the run.
    fn deploy_contract(
        &self,
        contract_name: &str,
        constructor_args: &[String],
    ) -> impl Future<Output = eyre::Result<ContractHandle>> + Send;
}

/// Output bindings of an executed module: symbolic name to handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleOutput(BTreeMap<String, ContractHandle>);

impl ModuleOutput {
    /// Output with a single binding.
    pub fn single(name: impl Into<String>, handle: ContractHandle) -> Self {
        Self(BTreeMap::from([(name.into(), handle)]))
    }

    pub fn get(&self, name: &str) -> Option<&ContractHandle> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContractHandle)> {
        self.0.iter()
    }
}

/// Execute a deployment unit against a context.
///
/// Requests exactly one contract instantiation and binds the result under the
/// unit's output name.
pub async fn execute<C>(unit: &DeploymentUnit, ctx: &C) -> eyre::Result<ModuleOutput>
where
    C: DeploymentContext,
{
    debug!(
        module = %unit.module_name,
        contract = %unit.contract_name,
        args = unit.constructor_args.len(),
        network = ctx.network(),
        "Executing deployment module"
    );

    let handle = ctx
        .deploy_contract(&unit.contract_name, &unit.constructor_args)
        .await?;

    info!(
        module = %unit.module_name,
        contract = %handle.contract_name,
        address = %handle.address,
        "Module executed"
    );

    Ok(ModuleOutput::single(unit.output_name.clone(), handle))
}
