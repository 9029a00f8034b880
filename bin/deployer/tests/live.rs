//! Deployments against real nodes.
//!
//! These need compiled artifacts under `artifacts/` and a reachable node, so
//! they are ignored by default. Run with:
//! ```bash
//! cargo test --package deployer --test live -- --ignored
//! ```

use config::{Config, NetworkProfile, ProcessEnv, SigningKey};
use deploy::{ArtifactStore, ChainContext, Journal};
use deployer::{connect_provider, deploy_module, metrics::Metrics};
use module::{DeploymentContext, Registry};
use setup::load_private_key;

#[tokio::test]
#[ignore = "requires a local node at 127.0.0.1:8545 and compiled artifacts"]
async fn test_deploy_to_local_node() -> eyre::Result<()> {
    let profile = NetworkProfile::localhost();
    let provider = connect_provider(&profile)?;
    let artifacts = ArtifactStore::new("artifacts");
    let ctx = ChainContext::connect(provider, profile.clone(), artifacts).await?;
    assert_eq!(ctx.network(), "localhost");

    let dir = tempfile::tempdir()?;
    let mut journal = Journal::open(dir.path(), &profile)?;
    let registry = Registry::builtin();
    let unit = registry.get("UserRegistryModule")?;

    let outcome = deploy_module(unit, &ctx, &mut journal, false, &Metrics::new()).await?;
    let handle = outcome.output().get("userRegistryModule").unwrap();
    println!("✓ UserRegistry deployed at {}", handle.address);
    assert!(handle.tx_hash.is_some());

    Ok(())
}

#[tokio::test]
#[ignore = "requires RSK_TESTNET_RPC_URL, a funded PRIVATE_KEY and API_KEY"]
async fn test_testnet_chain_id_check() -> eyre::Result<()> {
    let config = Config::load(&ProcessEnv::load())?;
    let profile = config.network("rskTestnet")?.clone();
    assert_eq!(profile.chain_id, 31);

    // Binding succeeds only if the endpoint really serves chain 31.
    let provider = connect_provider(&profile)?;
    ChainContext::connect(provider, profile.clone(), ArtifactStore::new("artifacts")).await?;

    // A profile pointed at the wrong chain is refused before sending anything.
    let key = load_private_key().expect("PRIVATE_KEY required");
    let mut wrong = NetworkProfile::rsk_mainnet(profile.rpc_url.clone(), SigningKey::new(key));
    wrong.name = "misconfigured".to_string();
    let provider = connect_provider(&wrong)?;
    assert!(ChainContext::connect(provider, wrong, ArtifactStore::new("artifacts"))
        .await
        .is_err());

    Ok(())
}
