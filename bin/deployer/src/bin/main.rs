//! Deploy and verify contract modules on Rootstock networks.
//!
//! - `deploy`: run a module against a network (skipped if already journaled)
//! - `verify`: verify a journaled module on the network's block explorer
//! - `modules`: list registered modules
//! - `networks`: list enabled networks

use clap::{Parser, Subcommand};
use config::{Config, ProcessEnv};
use deploy::{ArtifactStore, ChainContext, Journal};
use deployer::{
    connect_provider, deploy_module,
    metrics::{install_prometheus_exporter, Metrics},
    verify_module,
};
use module::{ModuleOutput, Registry};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use verify::VerifierClient;

#[derive(Parser)]
#[command(name = "deployer")]
#[command(about = "Deploy and verify contract modules on Rootstock networks")]
struct Cli {
    /// Compiled artifacts directory
    #[arg(long, default_value = "artifacts")]
    artifacts: PathBuf,

    /// Directory holding per-network deployment journals
    #[arg(long, default_value = "deployments")]
    deployments: PathBuf,

    /// Optional manifest of additional modules
    #[arg(long, default_value = "modules.toml")]
    modules: PathBuf,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Serve Prometheus metrics on this port while running
    #[arg(long, env = "DEPLOYER_METRICS_PORT")]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy a module to a network
    Deploy {
        /// Module name, e.g. CreateRegistryModule
        module: String,

        /// Target network, e.g. rskTestnet
        #[arg(short, long)]
        network: String,

        /// Verify on the block explorer after deploying
        #[arg(long)]
        verify: bool,

        /// Redeploy even if the journal already records the module
        #[arg(long)]
        force: bool,
    },

    /// Verify a deployed module on the network's block explorer
    Verify {
        module: String,

        #[arg(short, long)]
        network: String,
    },

    /// List registered modules
    Modules,

    /// List enabled networks
    Networks,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_registry(manifest: &Path) -> eyre::Result<Registry> {
    let mut registry = Registry::builtin();
    if manifest.is_file() {
        let added = registry.extend_from_file(manifest)?;
        info!(path = %manifest.display(), added, "Loaded module manifest");
    }
    Ok(registry)
}

fn print_output(output: &ModuleOutput) {
    for (name, handle) in output.iter() {
        println!("{name}: {} @ {}", handle.contract_name, handle.address);
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Required values are checked before anything touches the network.
    let config = Config::load(&ProcessEnv::load())?;

    if let Some(port) = cli.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Serving metrics");
    }
    let metrics = Metrics::new();

    let registry = load_registry(&cli.modules)?;
    let artifacts = ArtifactStore::new(&cli.artifacts);

    match cli.command {
        Command::Deploy {
            module,
            network,
            verify,
            force,
        } => {
            let unit = registry.get(&module)?;
            let profile = config.network(&network)?;

            info!(
                module = %unit.module_name,
                contract = %unit.contract_name,
                network = %profile.name,
                chain_id = profile.chain_id,
                "Deploying"
            );

            let mut journal = Journal::open_locked(&cli.deployments, profile)?;
            let provider = connect_provider(profile)?;
            let ctx = ChainContext::connect(provider, profile.clone(), artifacts.clone()).await?;

            let outcome = deploy_module(unit, &ctx, &mut journal, force, &metrics).await?;
            print_output(outcome.output());

            if verify {
                match config.verification_for(&network) {
                    Some(profile) => {
                        let client = VerifierClient::new(profile.clone());
                        // Deployment stands regardless of the explorer's answer.
                        if let Err(e) = verify_module(
                            &client,
                            unit,
                            &journal,
                            &artifacts,
                            config.solc_version(),
                            &metrics,
                        )
                        .await
                        {
                            warn!(error = ?e, module = %unit.module_name, "Verification failed");
                        }
                    }
                    None => warn!(network = %network, "No verification service for network"),
                }
            }
        }
        Command::Verify { module, network } => {
            let unit = registry.get(&module)?;
            let profile = config.network(&network)?;
            let verification = config.verification_for(&network).ok_or_else(|| {
                eyre::eyre!("No verification service configured for {network}")
            })?;

            let journal = Journal::open(&cli.deployments, profile)?;
            let client = VerifierClient::new(verification.clone());
            let outcome = verify_module(
                &client,
                unit,
                &journal,
                &artifacts,
                config.solc_version(),
                &metrics,
            )
            .await?;
            println!("{module}: {outcome:?}");
        }
        Command::Modules => {
            for unit in registry.iter() {
                println!(
                    "{:<24} {:<20} {} arg(s) -> {}",
                    unit.module_name,
                    unit.contract_name,
                    unit.constructor_args.len(),
                    unit.output_name
                );
            }
        }
        Command::Networks => {
            for profile in config.networks().values() {
                let gas_price = profile
                    .gas_price
                    .map_or_else(|| "auto".to_string(), |p| p.to_string());
                let explorer = config
                    .verification_for(&profile.name)
                    .map_or("-", |v| v.explorer_url.as_str());
                println!(
                    "{:<12} chain {:<6} gas price {:<10} {}",
                    profile.name, profile.chain_id, gas_price, explorer
                );
            }
        }
    }

    Ok(())
}
