//! Registry of deployment modules.
//!
//! The built-in modules can be extended from a TOML manifest:
//!
//! ```toml
//! [[module]]
//! name = "VaultModule"
//! contract = "Vault"
//! output = "vault"            # optional, defaults to `vaultModule`
//! args = ["0x0000000000000000000000000000000000000001", 100]
//! ```

use crate::unit::{default_output_name, DeploymentUnit};
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Module {0} is already registered")]
    DuplicateModule(String),

    #[error("Module, contract and output names must not be empty")]
    EmptyName,

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported argument in module {module}: {reason}")]
    InvalidArgument { module: String, reason: String },
}

/// Set of deployment modules, unique by module name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    modules: BTreeMap<String, DeploymentUnit>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the project's contracts.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for unit in [
            DeploymentUnit::new("CreateRegistryModule", "CreatorRegistry"),
            DeploymentUnit::new("StreamTokenModule", "StreamToken"),
            DeploymentUnit::new("UserRegistryModule", "UserRegistry"),
        ] {
            registry.modules.insert(unit.module_name.clone(), unit);
        }
        registry
    }

    /// Add a module. Names must be non-empty and unique.
    pub fn register(&mut self, unit: DeploymentUnit) -> Result<(), ModuleError> {
        if unit.module_name.is_empty()
            || unit.contract_name.is_empty()
            || unit.output_name.is_empty()
        {
            return Err(ModuleError::EmptyName);
        }
        if self.modules.contains_key(&unit.module_name) {
            return Err(ModuleError::DuplicateModule(unit.module_name));
        }
        debug!(module = %unit.module_name, contract = %unit.contract_name, "Registered module");
        self.modules.insert(unit.module_name.clone(), unit);
        Ok(())
    }

    pub fn get(&self, module_name: &str) -> Result<&DeploymentUnit, ModuleError> {
        self.modules
            .get(module_name)
            .ok_or_else(|| ModuleError::UnknownModule(module_name.to_string()))
    }

    /// Modules in name order.
    pub fn iter(&self) -> impl Iterator<Item = &DeploymentUnit> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Register every module declared in a manifest string.
    ///
    /// Either all modules are added or, on error, none are.
    pub fn extend_from_toml(&mut self, contents: &str) -> Result<usize, ModuleError> {
        let manifest: Manifest = toml::from_str(contents)?;
        let count = manifest.module.len();
        let mut staged = self.clone();
        for entry in manifest.module {
            staged.register(entry.into_unit()?)?;
        }
        *self = staged;
        Ok(count)
    }

    /// Register every module declared in a manifest file.
    pub fn extend_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize, ModuleError> {
        let contents = std::fs::read_to_string(path)?;
        self.extend_from_toml(&contents)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    module: Vec<ManifestModule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestModule {
    name: String,
    contract: String,
    output: Option<String>,
    #[serde(default)]
    args: Vec<toml::Value>,
}

impl ManifestModule {
    fn into_unit(self) -> Result<DeploymentUnit, ModuleError> {
        let constructor_args = self
            .args
            .iter()
            .map(to_literal)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| ModuleError::InvalidArgument {
                module: self.name.clone(),
                reason,
            })?;

        Ok(DeploymentUnit {
            output_name: self
                .output
                .unwrap_or_else(|| default_output_name(&self.name)),
            module_name: self.name,
            contract_name: self.contract,
            constructor_args,
        })
    }
}

/// Render a TOML value as a Solidity literal.
fn to_literal(value: &toml::Value) -> Result<String, String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Array(items) => {
            let items = items.iter().map(to_literal).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[{}]", items.join(",")))
        }
        other => Err(format!("{} values are not supported", other.type_str())),
    }
}
