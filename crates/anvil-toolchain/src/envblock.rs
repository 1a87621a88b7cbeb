//! Architecture environment blocks
//!
//! The build configuration step captures the process environment needed by
//! each target architecture (include paths, lib paths, SDK selection) into a
//! block file: a null-separated sequence of `KEY=VALUE` entries followed by
//! two terminator bytes, one for the final entry and one for the list. That
//! environment is restored verbatim before every toolchain invocation so a
//! link for x86 and a link for x64 each see the toolchain they were
//! configured with.

use crate::error::{ToolchainError, ToolchainResult};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A process environment restored from a captured block
#[derive(Debug, Clone, Default)]
pub struct EnvBlock {
    vars: HashMap<String, String>,
}

impl EnvBlock {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a captured environment block from a file
    pub fn load(path: impl AsRef<Path>) -> ToolchainResult<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).map_err(|error| ToolchainError::env_block_read(path, error))?;
        Ok(Self::parse(&bytes))
    }

    /// Parse a serialized environment block
    ///
    /// Drops the two trailing terminator bytes, splits entries on the null
    /// separator, and splits each entry on the first `=`. Duplicate keys are
    /// last-wins; entry shape beyond the split is not validated.
    pub fn parse(bytes: &[u8]) -> Self {
        let body = &bytes[..bytes.len().saturating_sub(2)];
        let mut vars = HashMap::new();
        for entry in body.split(|&b| b == 0) {
            let entry = String::from_utf8_lossy(entry);
            if let Some((key, value)) = entry.split_once('=') {
                vars.insert(key.to_string(), value.to_string());
            }
        }
        Self { vars }
    }

    /// Look up a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set a variable, replacing any existing value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Overlay ambient variables that are not already present
    ///
    /// Captured variables always win; the overlay only fills gaps. The
    /// ambient set is an explicit parameter so callers decide what leaks in.
    pub fn overlay<I, K, V>(&mut self, ambient: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in ambient {
            self.vars.entry(key.into()).or_insert_with(|| value.into());
        }
    }

    /// Iterate over all variables
    pub fn vars(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the environment is empty
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvBlock {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Self::new();
        for (key, value) in iter {
            env.set(key, value);
        }
        env
    }
}
