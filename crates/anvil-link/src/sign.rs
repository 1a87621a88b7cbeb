//! Post-link signing hook
//!
//! Signing is an opaque collaborator: when a tool and key are configured,
//! every linked binary gets handed to it, and a signer failure fails the
//! build. Configuration is read from the ambient environment once at the
//! CLI boundary and passed down explicitly so the pipeline itself never
//! touches process-global state.

use crate::error::{LinkError, LinkResult};
use std::collections::HashSet;
use std::env;
use std::process::Command;

/// Ambient variable naming the signing tool executable
pub const SIGN_TOOL_VAR: &str = "ANVIL_SIGN_TOOL";
/// Ambient variable holding the signing key arguments (whitespace-split)
pub const SIGN_KEY_VAR: &str = "ANVIL_SIGN_KEY";

const SIGNABLE_EXTENSIONS: [&str; 2] = ["dll", "exe"];

/// Signing tool configuration
#[derive(Debug, Clone)]
pub struct SignConfig {
    tool: String,
    key_args: Vec<String>,
}

impl SignConfig {
    pub fn new(tool: impl Into<String>, key_args: Vec<String>) -> Self {
        Self {
            tool: tool.into(),
            key_args,
        }
    }

    /// Read the signing configuration from the ambient environment
    ///
    /// Returns `None` unless both variables are present and non-empty;
    /// an unsigned build is the normal case, not an error.
    pub fn from_env() -> Option<Self> {
        let tool = env::var(SIGN_TOOL_VAR).ok().filter(|v| !v.is_empty())?;
        let key = env::var(SIGN_KEY_VAR).ok().filter(|v| !v.is_empty())?;
        Some(Self::new(
            tool,
            key.split_whitespace().map(str::to_string).collect(),
        ))
    }

    /// Sign every signable target, first failure wins
    ///
    /// Targets without a `dll`/`exe` extension are skipped; duplicates are
    /// signed once. The signer inherits our environment and streams. Returns
    /// 0 or the first non-zero signer exit code.
    pub fn sign_targets<'a, I>(&self, targets: I) -> LinkResult<i32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        for target in targets {
            if !signable(target) || !seen.insert(target.to_string()) {
                continue;
            }
            println!("Signing {target}");
            let status = Command::new(&self.tool)
                .arg("sign")
                .arg("/v")
                .args(&self.key_args)
                .arg(target)
                .status()
                .map_err(|error| LinkError::sign_launch(&self.tool, error))?;
            let code = status.code().unwrap_or(1);
            if code != 0 {
                return Ok(code);
            }
        }
        Ok(0)
    }
}

fn signable(target: &str) -> bool {
    match target.rsplit_once('.') {
        Some((_, ext)) => SIGNABLE_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("ui.dll", true)]
    #[case("app.exe", true)]
    #[case("APP.EXE", true)]
    #[case("C:\\out\\ui.DLL", true)]
    #[case("notes.txt", false)]
    #[case("archive.lib", false)]
    #[case("noext", false)]
    fn test_signable(#[case] target: &str, #[case] expected: bool) {
        assert_eq!(signable(target), expected);
    }

    #[test]
    fn test_config_construction() {
        let config = SignConfig::new("signtool.exe", vec!["/f".into(), "key.pfx".into()]);
        assert_eq!(config.tool, "signtool.exe");
        assert_eq!(config.key_args, vec!["/f", "key.pfx"]);
    }

    #[test]
    fn test_sign_skips_everything_unsignable() {
        // No signable target means the tool is never launched, so a bogus
        // tool path must not matter.
        let config = SignConfig::new("/no/such/signtool", vec![]);
        let code = config.sign_targets(["notes.txt", "archive.lib"]).unwrap();
        assert_eq!(code, 0);
    }
}
