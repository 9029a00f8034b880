//! Journal-aware module runs against a recording context.
//!
//! Run with:
//! ```bash
//! cargo test --package deployer --test deploy
//! ```

use alloy_primitives::Address;
use config::{NetworkProfile, SigningKey};
use deploy::{ArtifactStore, Journal};
use deployer::{deploy_module, metrics::Metrics, verification_request, verify_module};
use module::{DeploymentUnit, Registry};
use serde_json::json;
use setup::{write_artifact, write_artifact_with_abi, RecordingContext};
use verify::VerifierClient;

fn testnet() -> NetworkProfile {
    NetworkProfile::rsk_testnet("http://x", SigningKey::new("k"))
}

#[tokio::test]
async fn test_deploy_then_skip() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = Registry::builtin();
    let unit = registry.get("CreateRegistryModule")?;
    let ctx = RecordingContext::default();
    let metrics = Metrics::new();

    let mut journal = Journal::open(dir.path(), &testnet())?;
    let first = deploy_module(unit, &ctx, &mut journal, false, &metrics).await?;
    assert!(!first.is_skipped());
    let handle = first.output().get("createRegistryModule").unwrap();
    assert_eq!(handle.contract_name, "CreatorRegistry");

    // A fresh run reads the journal from disk and sends nothing.
    let mut journal = Journal::open(dir.path(), &testnet())?;
    let second = deploy_module(unit, &ctx, &mut journal, false, &metrics).await?;
    assert!(second.is_skipped());
    assert_eq!(second.output(), first.output());
    assert_eq!(ctx.deploy_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_force_redeploys() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let unit = DeploymentUnit::new("StreamTokenModule", "StreamToken");
    let ctx = RecordingContext::default();
    let metrics = Metrics::new();
    let mut journal = Journal::open(dir.path(), &testnet())?;

    deploy_module(&unit, &ctx, &mut journal, false, &metrics).await?;
    let forced = deploy_module(&unit, &ctx, &mut journal, true, &metrics).await?;

    assert!(!forced.is_skipped());
    assert_eq!(ctx.deploy_count(), 2);
    assert_eq!(
        journal.get("StreamTokenModule").unwrap().address,
        Address::with_last_byte(2)
    );

    Ok(())
}

#[tokio::test]
async fn test_changed_contract_requires_force() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let ctx = RecordingContext::default();
    let metrics = Metrics::new();
    let mut journal = Journal::open(dir.path(), &testnet())?;

    let first = DeploymentUnit::new("UserRegistryModule", "UserRegistry");
    deploy_module(&first, &ctx, &mut journal, false, &metrics).await?;

    let changed = DeploymentUnit::new("UserRegistryModule", "UserRegistryV2");
    let err = deploy_module(&changed, &ctx, &mut journal, false, &metrics)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("--force"));
    assert_eq!(ctx.deploy_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_changed_constructor_args_require_force() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let ctx = RecordingContext::default();
    let metrics = Metrics::new();
    let mut journal = Journal::open(dir.path(), &testnet())?;

    let first = DeploymentUnit::new("VaultModule", "Vault").with_args(["1"]);
    deploy_module(&first, &ctx, &mut journal, false, &metrics).await?;

    let changed = DeploymentUnit::new("VaultModule", "Vault").with_args(["2"]);
    let err = deploy_module(&changed, &ctx, &mut journal, false, &metrics)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("constructor arguments"));
    assert!(err.to_string().contains("--force"));
    assert_eq!(ctx.deploy_count(), 1);

    let forced = deploy_module(&changed, &ctx, &mut journal, true, &metrics).await?;
    assert!(!forced.is_skipped());
    assert_eq!(ctx.deploy_count(), 2);
    assert_eq!(journal.get("VaultModule").unwrap().constructor_args, ["2"]);

    Ok(())
}

#[tokio::test]
async fn test_failed_deployment_is_not_journaled() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let unit = DeploymentUnit::new("StreamTokenModule", "StreamToken");
    let ctx = RecordingContext::failing();
    let mut journal = Journal::open(dir.path(), &testnet())?;

    let err = deploy_module(&unit, &ctx, &mut journal, false, &Metrics::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("StreamTokenModule"));
    assert!(format!("{err:?}").contains("insufficient funds"));
    assert!(journal.get("StreamTokenModule").is_none());
    assert!(Journal::open(dir.path(), &testnet())?
        .get("StreamTokenModule")
        .is_none());

    Ok(())
}

#[tokio::test]
async fn test_verification_request_from_journal() -> eyre::Result<()> {
    let deployments = tempfile::tempdir()?;
    let artifacts_dir = tempfile::tempdir()?;
    write_artifact(artifacts_dir.path(), "CreatorRegistry", "0.8.27");

    let registry = Registry::builtin();
    let unit = registry.get("CreateRegistryModule")?;
    let mut journal = Journal::open(deployments.path(), &testnet())?;
    let ctx = RecordingContext::default();
    deploy_module(unit, &ctx, &mut journal, false, &Metrics::new()).await?;

    let entry = journal.get("CreateRegistryModule").unwrap();
    let artifacts = ArtifactStore::new(artifacts_dir.path());
    let request = verification_request(entry, &artifacts, "0.8.27")?;

    assert_eq!(request.address, entry.address);
    assert_eq!(
        request.artifact_id,
        "contracts/CreatorRegistry.sol:CreatorRegistry"
    );
    assert_eq!(request.compiler_version, "0.8.27+commit.40a35a09");
    assert!(request.constructor_args.is_empty());
    assert_eq!(request.standard_json_input["language"], "Solidity");

    Ok(())
}

#[tokio::test]
async fn test_verification_uses_journaled_args() -> eyre::Result<()> {
    let deployments = tempfile::tempdir()?;
    let artifacts_dir = tempfile::tempdir()?;
    let abi = json!([{
        "type": "constructor",
        "stateMutability": "nonpayable",
        "inputs": [{ "name": "cap", "type": "uint256", "internalType": "uint256" }]
    }]);
    write_artifact_with_abi(artifacts_dir.path(), "Vault", "0.8.27", abi);

    let unit = DeploymentUnit::new("VaultModule", "Vault").with_args(["7"]);
    let mut journal = Journal::open(deployments.path(), &testnet())?;
    let ctx = RecordingContext::default();
    deploy_module(&unit, &ctx, &mut journal, false, &Metrics::new()).await?;

    let entry = journal.get("VaultModule").unwrap();
    let artifacts = ArtifactStore::new(artifacts_dir.path());
    let request = verification_request(entry, &artifacts, "0.8.27")?;

    let mut expected = [0u8; 32];
    expected[31] = 7;
    assert_eq!(request.constructor_args.as_ref(), expected.as_slice());

    Ok(())
}

#[tokio::test]
async fn test_verify_requires_deployment() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = config::Config::load(
        &config::MapEnv::new()
            .with(config::RSK_TESTNET_RPC_URL, "http://x")
            .with(config::PRIVATE_KEY, "k")
            .with(config::API_KEY, "a"),
    )?;
    let profile = config.network("rskTestnet")?;
    let client = VerifierClient::new(config.verification_for("rskTestnet").unwrap().clone());
    let journal = Journal::open(dir.path(), profile)?;
    let unit = DeploymentUnit::new("UserRegistryModule", "UserRegistry");

    let err = verify_module(
        &client,
        &unit,
        &journal,
        &ArtifactStore::new(dir.path()),
        config.solc_version(),
        &Metrics::new(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("no deployment on rskTestnet"));

    Ok(())
}
