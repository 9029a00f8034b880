use crate::artifact::ArtifactStore;
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use alloy_rpc_types::{TransactionReceipt, TransactionRequest};
use config::NetworkProfile;
use eyre::{eyre, WrapErr};
use module::{ContractHandle, DeploymentContext};
use std::time::Duration;
use tracing::{debug, info};

/// Default time to wait for a creation receipt.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Deploys contracts to one network through an alloy provider.
///
/// Live networks sign with the provider's wallet. Local nodes send from their
/// first unlocked account.
pub struct ChainContext<P> {
    provider: P,
    profile: NetworkProfile,
    artifacts: ArtifactStore,
    from: Option<Address>,
    confirmation_timeout: Duration,
}

impl<P> ChainContext<P>
where
    P: Provider + Clone,
{
    /// Bind a provider to a network profile.
    ///
    /// Fails before any transaction is sent if the profile is incomplete or
    /// the endpoint serves a different chain.
    pub async fn connect(
        provider: P,
        profile: NetworkProfile,
        artifacts: ArtifactStore,
    ) -> eyre::Result<Self> {
        profile.ensure_live_ready()?;

        client::ensure_chain_id(&provider, profile.chain_id)
            .await
            .wrap_err_with(|| format!("Network {} failed chain id check", profile.name))?;

        let from = if profile.local {
            let account = client::first_unlocked_account(&provider, &profile.rpc_url).await?;
            debug!(account = %account, "Using unlocked local account");
            Some(account)
        } else {
            None
        };

        Ok(Self {
            provider,
            profile,
            artifacts,
            from,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        })
    }

    pub const fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub const fn profile(&self) -> &NetworkProfile {
        &self.profile
    }
}

/// Contract creation transaction under a profile's gas policy.
///
/// Profiles with a fixed gas price send legacy transactions at that price.
fn creation_request(
    profile: &NetworkProfile,
    from: Option<Address>,
    code: Bytes,
) -> TransactionRequest {
    let mut tx = TransactionRequest::default().with_deploy_code(code);
    if let Some(gas_price) = profile.gas_price {
        tx = tx.with_gas_price(gas_price);
    }
    if let Some(from) = from {
        tx = tx.with_from(from);
    }
    tx
}

/// Address of the contract a creation receipt reports.
fn deployed_address(contract_name: &str, receipt: &TransactionReceipt) -> eyre::Result<Address> {
    let tx_hash = receipt.transaction_hash;
    if !receipt.status() {
        eyre::bail!("Deployment of {contract_name} reverted in {tx_hash}");
    }
    receipt
        .contract_address
        .ok_or_else(|| eyre!("Receipt for {tx_hash} has no contract address"))
}

impl<P> DeploymentContext for ChainContext<P>
where
    P: Provider + Clone + Send + Sync,
{
    fn network(&self) -> &str {
        &self.profile.name
    }

    async fn deploy_contract(
        &self,
        contract_name: &str,
        constructor_args: &[String],
    ) -> eyre::Result<ContractHandle> {
        let artifact = self.artifacts.load(contract_name)?;
        let code = artifact.deployment_code(constructor_args)?;

        let tx = creation_request(&self.profile, self.from, code);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .wrap_err_with(|| format!("Failed to submit deployment of {contract_name}"))?;
        let tx_hash = *pending.tx_hash();

        info!(
            contract = contract_name,
            network = %self.profile.name,
            tx_hash = %tx_hash,
            "Deployment transaction sent"
        );

        let receipt = pending
            .with_timeout(Some(self.confirmation_timeout))
            .get_receipt()
            .await
            .wrap_err_with(|| format!("No receipt for deployment of {contract_name}"))?;

        let address = deployed_address(contract_name, &receipt)?;

        info!(
            contract = contract_name,
            address = %address,
            block = receipt.block_number,
            gas_used = receipt.gas_used,
            "Contract deployed"
        );

        Ok(ContractHandle {
            contract_name: artifact.contract_name.clone(),
            address,
            artifact_id: artifact.id(),
            tx_hash: Some(tx_hash),
        })
    }
}
