//! Sources of named external values.

use std::collections::HashMap;
use tracing::debug;

/// A source of named configuration values.
///
/// Implementations return `None` for absent values. Callers treat empty and
/// whitespace-only values as absent too, see [`EnvSource::get_non_empty`].
pub trait EnvSource {
    /// Look up a raw value by name.
    fn get(&self, name: &str) -> Option<String>;

    /// Look up a value, treating empty or whitespace-only strings as absent.
    fn get_non_empty(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Reads the process environment, after loading an optional `.env` file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv {
    _private: (),
}

impl ProcessEnv {
    /// Load `.env` from the working directory (if any) and return the source.
    ///
    /// Variables already set in the process environment take precedence over
    /// the file.
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => debug!(error = %e, "Ignoring unreadable .env file"),
        }
        Self { _private: () }
    }
}

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory environment, used by tests and embedders.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
