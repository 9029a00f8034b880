pub mod metrics;

use crate::metrics::Metrics;
use alloy_provider::{DynProvider, Provider};
use config::NetworkProfile;
use deploy::{ArtifactStore, Journal, JournalEntry};
use eyre::{eyre, WrapErr};
use module::{DeploymentContext, DeploymentUnit, ModuleOutput};
use std::time::Instant;
use tracing::{info, warn};
use verify::{VerificationOutcome, VerificationRequest, VerifierClient};

/// Result of running a module against a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The module ran and its output was journaled
    Deployed(ModuleOutput),
    /// The journal already held the module; nothing was sent
    Skipped(ModuleOutput),
}

impl DeployOutcome {
    pub const fn output(&self) -> &ModuleOutput {
        match self {
            Self::Deployed(output) | Self::Skipped(output) => output,
        }
    }

    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Provider for a network: wallet-backed when the profile has a key.
pub fn connect_provider(profile: &NetworkProfile) -> eyre::Result<DynProvider> {
    let provider = match &profile.signing_key {
        Some(key) => client::create_wallet_provider(&profile.rpc_url, key.expose())?.erased(),
        None => client::create_provider(&profile.rpc_url)?.erased(),
    };
    Ok(provider)
}

/// Run a module unless the journal already records it for this network.
///
/// With `force`, the module is redeployed and the journal entry replaced.
pub async fn deploy_module<C>(
    unit: &DeploymentUnit,
    ctx: &C,
    journal: &mut Journal,
    force: bool,
    metrics: &Metrics,
) -> eyre::Result<DeployOutcome>
where
    C: DeploymentContext,
{
    let network = ctx.network();

    if let Some(entry) = journal.get(&unit.module_name) {
        if !force {
            if entry.contract_name != unit.contract_name {
                eyre::bail!(
                    "Journal records {} as {}, but the module now deploys {}; rerun with --force",
                    unit.module_name,
                    entry.contract_name,
                    unit.contract_name
                );
            }
            if entry.constructor_args != unit.constructor_args {
                eyre::bail!(
                    "Journal records {} with constructor arguments {:?}, but the module now passes {:?}; rerun with --force",
                    unit.module_name,
                    entry.constructor_args,
                    unit.constructor_args
                );
            }

            info!(
                module = %unit.module_name,
                network,
                address = %entry.address,
                "Module already deployed, skipping"
            );
            metrics.record_skipped(network);
            return Ok(DeployOutcome::Skipped(entry.output()));
        }
        warn!(module = %unit.module_name, network, "Forcing redeployment");
    }

    let start = Instant::now();
    let result = module::execute(unit, ctx).await;
    metrics.record_deployment(network, result.is_ok(), start.elapsed());

    let output = result
        .wrap_err_with(|| format!("Module {} failed on {}", unit.module_name, network))?;
    journal.record(unit, &output)?;

    Ok(DeployOutcome::Deployed(output))
}

/// Assemble what the explorer needs to verify a journaled module.
///
/// Constructor arguments come from the journal, so the request describes the
/// contract as it was deployed.
pub fn verification_request(
    entry: &JournalEntry,
    artifacts: &ArtifactStore,
    solc_version: &str,
) -> eyre::Result<VerificationRequest> {
    let artifact = artifacts.load(&entry.contract_name)?;
    let build_info = artifacts.build_info(&entry.contract_name)?;

    if build_info.solc_version != solc_version {
        warn!(
            contract = %entry.contract_name,
            compiled_with = %build_info.solc_version,
            pinned = solc_version,
            "Artifact was not built with the pinned compiler"
        );
    }

    Ok(VerificationRequest {
        address: entry.address,
        artifact_id: entry.artifact_id.clone(),
        compiler_version: build_info.solc_long_version,
        standard_json_input: build_info.input,
        constructor_args: artifact.encode_constructor_args(&entry.constructor_args)?,
    })
}

/// Verify a module previously deployed to the journal's network.
pub async fn verify_module(
    client: &VerifierClient,
    unit: &DeploymentUnit,
    journal: &Journal,
    artifacts: &ArtifactStore,
    solc_version: &str,
    metrics: &Metrics,
) -> eyre::Result<VerificationOutcome> {
    let network = client.profile().network_name.as_str();
    let entry = journal.get(&unit.module_name).ok_or_else(|| {
        eyre!(
            "Module {} has no deployment on {} to verify",
            unit.module_name,
            network
        )
    })?;

    let result = async {
        let request = verification_request(entry, artifacts, solc_version)?;
        Ok::<_, eyre::Report>(client.verify(&request).await?)
    }
    .await;
    metrics.record_verification(network, result.is_ok());

    let outcome = result.wrap_err_with(|| format!("Verification of {} failed", unit.module_name))?;
    info!(
        module = %unit.module_name,
        url = %client.profile().address_url(entry.address),
        ?outcome,
        "Contract verified"
    );

    Ok(outcome)
}
