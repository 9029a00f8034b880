use serde::{Deserialize, Serialize};

/// Declarative description of one contract instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentUnit {
    /// Unique module name (e.g. `CreateRegistryModule`)
    pub module_name: String,
    /// Contract to instantiate
    pub contract_name: String,
    /// Symbolic name the deployed handle is bound to
    pub output_name: String,
    /// Constructor arguments as Solidity literals, in declaration order
    pub constructor_args: Vec<String>,
}

impl DeploymentUnit {
    /// Unit with no constructor arguments, output named after the module.
    pub fn new(module_name: impl Into<String>, contract_name: impl Into<String>) -> Self {
        let module_name = module_name.into();
        Self {
            output_name: default_output_name(&module_name),
            module_name,
            contract_name: contract_name.into(),
            constructor_args: Vec::new(),
        }
    }

    pub fn with_output(mut self, output_name: impl Into<String>) -> Self {
        self.output_name = output_name.into();
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constructor_args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// `CreateRegistryModule` -> `createRegistryModule`.
pub(crate) fn default_output_name(module_name: &str) -> String {
    let mut chars = module_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_name() {
        assert_eq!(default_output_name("CreateRegistryModule"), "createRegistryModule");
        assert_eq!(default_output_name("x"), "x");
        assert_eq!(default_output_name(""), "");
    }

    #[test]
    fn test_unit_builder() {
        let unit = DeploymentUnit::new("VaultModule", "Vault")
            .with_output("vault")
            .with_args(["0x0000000000000000000000000000000000000001"]);
        assert_eq!(unit.output_name, "vault");
        assert_eq!(unit.constructor_args.len(), 1);
    }
}
