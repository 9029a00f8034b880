//! Per-network deployment journal.
//!
//! One JSON file per network, `<root>/<network>/journal.json`, records which
//! modules have completed and what they produced. A module already in the
//! journal is not redeployed unless the caller forces it.

use alloy_primitives::{Address, TxHash};
use config::NetworkProfile;
use module::{ContractHandle, DeploymentUnit, ModuleOutput};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{File, TryLockError},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

const JOURNAL_FILE: &str = "journal.json";
const LOCK_FILE: &str = "journal.lock";

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt journal {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Journal {path} belongs to chain {found}, expected {expected}")]
    ChainMismatch {
        path: PathBuf,
        expected: u64,
        found: u64,
    },

    #[error("Module {module} produced no output named {output}")]
    MissingOutput { module: String, output: String },

    #[error("Journal lock {path} is held by another run")]
    Locked { path: PathBuf },
}

/// A completed module run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub contract_name: String,
    pub output_name: String,
    pub address: Address,
    pub artifact_id: String,
    pub tx_hash: Option<TxHash>,
    /// Constructor arguments the contract was deployed with
    #[serde(default)]
    pub constructor_args: Vec<String>,
}

impl JournalEntry {
    pub fn handle(&self) -> ContractHandle {
        ContractHandle {
            contract_name: self.contract_name.clone(),
            address: self.address,
            artifact_id: self.artifact_id.clone(),
            tx_hash: self.tx_hash,
        }
    }

    /// The module output this entry was recorded from.
    pub fn output(&self) -> ModuleOutput {
        ModuleOutput::single(self.output_name.clone(), self.handle())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JournalFile {
    chain_id: u64,
    #[serde(default)]
    modules: BTreeMap<String, JournalEntry>,
}

/// Deployment journal for a single network.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    file: JournalFile,
    lock: Option<File>,
}

impl Journal {
    /// Open (or start) the journal for a network under `root`.
    pub fn open(root: impl AsRef<Path>, network: &NetworkProfile) -> Result<Self, JournalError> {
        let path = root.as_ref().join(&network.name).join(JOURNAL_FILE);

        let file = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let file: JournalFile =
                    serde_json::from_str(&contents).map_err(|source| JournalError::Json {
                        path: path.clone(),
                        source,
                    })?;
                if file.chain_id != network.chain_id {
                    return Err(JournalError::ChainMismatch {
                        path,
                        expected: network.chain_id,
                        found: file.chain_id,
                    });
                }
                debug!(path = %path.display(), modules = file.modules.len(), "Opened journal");
                file
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => JournalFile {
                chain_id: network.chain_id,
                modules: BTreeMap::new(),
            },
            Err(source) => return Err(JournalError::Io { path, source }),
        };

        Ok(Self {
            path,
            file,
            lock: None,
        })
    }

    /// Open the journal and hold the network's lock until it is dropped.
    ///
    /// Only one locked journal per network can exist at a time, across
    /// processes, so two runs never share the deployer's nonce.
    pub fn open_locked(
        root: impl AsRef<Path>,
        network: &NetworkProfile,
    ) -> Result<Self, JournalError> {
        let dir = root.as_ref().join(&network.name);
        std::fs::create_dir_all(&dir).map_err(|source| JournalError::Io {
            path: dir.clone(),
            source,
        })?;

        let lock_path = dir.join(LOCK_FILE);
        let lock = File::options()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| JournalError::Io {
                path: lock_path.clone(),
                source,
            })?;
        match lock.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(JournalError::Locked { path: lock_path }),
            Err(TryLockError::Error(source)) => {
                return Err(JournalError::Io {
                    path: lock_path,
                    source,
                })
            }
        }
        debug!(path = %lock_path.display(), "Acquired journal lock");

        let mut journal = Self::open(root, network)?;
        journal.lock = Some(lock);
        Ok(journal)
    }

    pub const fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn chain_id(&self) -> u64 {
        self.file.chain_id
    }

    pub fn get(&self, module_name: &str) -> Option<&JournalEntry> {
        self.file.modules.get(module_name)
    }

    /// Recorded modules in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &JournalEntry)> {
        self.file.modules.iter()
    }

    /// Record a module's output and persist the journal.
    pub fn record(
        &mut self,
        unit: &DeploymentUnit,
        output: &ModuleOutput,
    ) -> Result<&JournalEntry, JournalError> {
        let handle = output
            .get(&unit.output_name)
            .ok_or_else(|| JournalError::MissingOutput {
                module: unit.module_name.clone(),
                output: unit.output_name.clone(),
            })?;

        let entry = JournalEntry {
            contract_name: handle.contract_name.clone(),
            output_name: unit.output_name.clone(),
            address: handle.address,
            artifact_id: handle.artifact_id.clone(),
            tx_hash: handle.tx_hash,
            constructor_args: unit.constructor_args.clone(),
        };
        self.file.modules.insert(unit.module_name.clone(), entry);
        self.save()?;

        Ok(&self.file.modules[&unit.module_name])
    }

    /// Write to a sibling temp file, then rename over the journal.
    fn save(&self) -> Result<(), JournalError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| JournalError::Io { path, source }
        };

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err(dir))?;
        }

        let contents =
            serde_json::to_string_pretty(&self.file).map_err(|source| JournalError::Json {
                path: self.path.clone(),
                source,
            })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(io_err(&tmp))?;
        std::fs::rename(&tmp, &self.path).map_err(io_err(&self.path))?;

        debug!(path = %self.path.display(), "Journal saved");
        Ok(())
    }
}
