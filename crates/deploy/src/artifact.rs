//! Compiled contract artifacts.
//!
//! Reads the layout produced by the Solidity toolchain:
//!
//! ```text
//! artifacts/
//!   build-info/<id>.json
//!   contracts/<Name>.sol/<Name>.json       abi, bytecode, link references
//!   contracts/<Name>.sol/<Name>.dbg.json   points at the build-info file
//! ```

use alloy_dyn_abi::{JsonAbiExt, Specifier};
use alloy_json_abi::JsonAbi;
use alloy_primitives::Bytes;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("No artifact for contract {contract} under {root}")]
    NotFound { contract: String, root: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed artifact {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Contract {0} has no creation bytecode (abstract or interface)")]
    NotDeployable(String),

    #[error("Contract {contract} needs library linking: {libraries:?}")]
    UnlinkedLibraries {
        contract: String,
        libraries: Vec<String>,
    },

    #[error("Invalid bytecode for {contract}: {reason}")]
    InvalidBytecode { contract: String, reason: String },

    #[error("Bad constructor arguments for {contract}: {reason}")]
    ConstructorArgs { contract: String, reason: String },
}

/// A compiled contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: JsonAbi,
    bytecode: String,
    #[serde(default)]
    link_references: BTreeMap<String, serde_json::Value>,
}

impl Artifact {
    /// ABI reference, `<sourceName>:<contractName>`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Creation bytecode, without constructor arguments.
    pub fn creation_code(&self) -> Result<Bytes, ArtifactError> {
        if !self.link_references.is_empty() {
            return Err(ArtifactError::UnlinkedLibraries {
                contract: self.contract_name.clone(),
                libraries: self.link_references.keys().cloned().collect(),
            });
        }

        let code: Bytes = self
            .bytecode
            .parse()
            .map_err(|e| ArtifactError::InvalidBytecode {
                contract: self.contract_name.clone(),
                reason: format!("{e}"),
            })?;

        if code.is_empty() {
            return Err(ArtifactError::NotDeployable(self.contract_name.clone()));
        }

        Ok(code)
    }

    /// ABI-encode constructor arguments given as Solidity literals.
    pub fn encode_constructor_args(&self, args: &[String]) -> Result<Bytes, ArtifactError> {
        let bad_args = |reason: String| ArtifactError::ConstructorArgs {
            contract: self.contract_name.clone(),
            reason,
        };

        let Some(constructor) = &self.abi.constructor else {
            if args.is_empty() {
                return Ok(Bytes::new());
            }
            return Err(bad_args(format!(
                "no constructor, but {} arguments given",
                args.len()
            )));
        };

        if constructor.inputs.len() != args.len() {
            return Err(bad_args(format!(
                "expected {} arguments, got {}",
                constructor.inputs.len(),
                args.len()
            )));
        }

        let values = constructor
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = param
                    .resolve()
                    .map_err(|e| format!("parameter {}: {e}", param.name))?;
                ty.coerce_str(arg)
                    .map_err(|e| format!("parameter {} ({}): {e}", param.name, param.ty))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(bad_args)?;

        let encoded = constructor
            .abi_encode_input(&values)
            .map_err(|e| bad_args(e.to_string()))?;

        Ok(encoded.into())
    }

    /// Creation bytecode followed by the encoded constructor arguments.
    pub fn deployment_code(&self, args: &[String]) -> Result<Bytes, ArtifactError> {
        let mut code = self.creation_code()?.to_vec();
        code.extend_from_slice(&self.encode_constructor_args(args)?);
        Ok(code.into())
    }
}

/// Compiler input and version for a compilation run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// Short version, e.g. `0.8.27`
    pub solc_version: String,
    /// Full version, e.g. `0.8.27+commit.40a35a09`
    pub solc_long_version: String,
    /// Standard-JSON compiler input
    pub input: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

/// Artifact directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the artifact for a contract name.
    pub fn load(&self, contract: &str) -> Result<Artifact, ArtifactError> {
        let path = self.locate(contract)?;
        debug!(contract, path = %path.display(), "Loading artifact");
        read_json(&path)
    }

    /// Load the build info a contract was compiled in.
    pub fn build_info(&self, contract: &str) -> Result<BuildInfo, ArtifactError> {
        let artifact_path = self.locate(contract)?;
        let dbg_path = artifact_path.with_extension("dbg.json");
        let dbg: DebugFile = read_json(&dbg_path)?;

        // The recorded path is relative to the debug file.
        let dir = dbg_path.parent().unwrap_or(&self.root);
        read_json(&dir.join(dbg.build_info))
    }

    /// Conventional `contracts/<Name>.sol/<Name>.json`, else the first match
    /// found under `contracts/`.
    fn locate(&self, contract: &str) -> Result<PathBuf, ArtifactError> {
        let contracts = self.root.join("contracts");
        let file_name = format!("{contract}.json");

        let conventional = contracts.join(format!("{contract}.sol")).join(&file_name);
        if conventional.is_file() {
            return Ok(conventional);
        }

        find_file(&contracts, &file_name)?.ok_or_else(|| ArtifactError::NotFound {
            contract: contract.to_string(),
            root: self.root.clone(),
        })
    }
}

fn find_file(dir: &Path, file_name: &str) -> Result<Option<PathBuf>, ArtifactError> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let io_err = |source| ArtifactError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = std::fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    // Deterministic pick when a name appears in several sources.
    entries.sort();

    for path in entries {
        if path.is_dir() {
            if let Some(found) = find_file(&path, file_name)? {
                return Ok(Some(found));
            }
        } else if path.file_name().is_some_and(|name| name == file_name) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}


#[cfg(test)]
mod tests {
    use super::{test_utils::write_artifact, *};
    use serde_json::json;

    fn token_abi() -> serde_json::Value {
        json!([{
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "owner", "type": "address", "internalType": "address" },
                { "name": "supply", "type": "uint256", "internalType": "uint256" }
            ]
        }])
    }

    #[test]
    fn test_load_conventional_path() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "CreatorRegistry", json!([]), "0x6080");

        let store = ArtifactStore::new(dir.path());
        let artifact = store.load("CreatorRegistry").unwrap();

        assert_eq!(artifact.contract_name, "CreatorRegistry");
        assert_eq!(artifact.id(), "contracts/CreatorRegistry.sol:CreatorRegistry");
        assert_eq!(artifact.creation_code().unwrap().as_ref(), &[0x60, 0x80]);
        assert!(artifact.encode_constructor_args(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_load_nested_source() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("contracts").join("tokens").join("Stream.sol");
        std::fs::create_dir_all(&nested).unwrap();
        let artifact = json!({
            "contractName": "StreamToken",
            "sourceName": "contracts/tokens/Stream.sol",
            "abi": [],
            "bytecode": "0x00",
        });
        std::fs::write(nested.join("StreamToken.json"), artifact.to_string()).unwrap();

        let loaded = ArtifactStore::new(dir.path()).load("StreamToken").unwrap();
        assert_eq!(loaded.id(), "contracts/tokens/Stream.sol:StreamToken");
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactStore::new(dir.path()).load("UserRegistry").unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::NotFound { contract, .. } if contract == "UserRegistry"
        ));
    }

    #[test]
    fn test_build_info() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "UserRegistry", json!([]), "0x6080");

        let info = ArtifactStore::new(dir.path()).build_info("UserRegistry").unwrap();
        assert_eq!(info.solc_version, "0.8.27");
        assert_eq!(info.solc_long_version, "0.8.27+commit.40a35a09");
        assert_eq!(info.input["language"], "Solidity");
    }

    #[test]
    fn test_interface_is_not_deployable() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "IRegistry", json!([]), "0x");

        let artifact = ArtifactStore::new(dir.path()).load("IRegistry").unwrap();
        assert!(matches!(
            artifact.creation_code(),
            Err(ArtifactError::NotDeployable(_))
        ));
    }

    #[test]
    fn test_unlinked_libraries_rejected() {
        let artifact: Artifact = serde_json::from_value(json!({
            "contractName": "Vault",
            "sourceName": "contracts/Vault.sol",
            "abi": [],
            "bytecode": "0x6080__$abcdef$__",
            "linkReferences": { "contracts/Math.sol": { "Math": [] } }
        }))
        .unwrap();

        match artifact.creation_code() {
            Err(ArtifactError::UnlinkedLibraries { libraries, .. }) => {
                assert_eq!(libraries, vec!["contracts/Math.sol".to_string()]);
            }
            other => panic!("expected unlinked libraries, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_constructor_args() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "StreamToken", token_abi(), "0x6080");
        let artifact = ArtifactStore::new(dir.path()).load("StreamToken").unwrap();

        let args = vec![
            "0x0000000000000000000000000000000000000001".to_string(),
            "1000".to_string(),
        ];
        let encoded = artifact.encode_constructor_args(&args).unwrap();
        assert_eq!(encoded.len(), 64);
        assert_eq!(encoded[31], 1);
        assert_eq!(&encoded[62..], &[0x03, 0xe8]);

        let code = artifact.deployment_code(&args).unwrap();
        assert_eq!(code.len(), 2 + 64);
        assert_eq!(&code[..2], &[0x60, 0x80]);
    }

    #[test]
    fn test_constructor_arity_and_type_checked() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "StreamToken", token_abi(), "0x6080");
        let artifact = ArtifactStore::new(dir.path()).load("StreamToken").unwrap();

        assert!(matches!(
            artifact.encode_constructor_args(&[]),
            Err(ArtifactError::ConstructorArgs { .. })
        ));
        assert!(matches!(
            artifact.encode_constructor_args(&["not-an-address".to_string(), "1".to_string()]),
            Err(ArtifactError::ConstructorArgs { .. })
        ));
    }

    #[test]
    fn test_args_without_constructor_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "UserRegistry", json!([]), "0x6080");
        let artifact = ArtifactStore::new(dir.path()).load("UserRegistry").unwrap();

        assert!(matches!(
            artifact.encode_constructor_args(&["1".to_string()]),
            Err(ArtifactError::ConstructorArgs { .. })
        ));
    }
}
