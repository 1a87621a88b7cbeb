//! Linker argument vector helpers
//!
//! The link command line is owned by the build graph; the only flags this
//! system reads back out of it are the output path (for signing candidates
//! and PDB server endpoints) and the leading program token.

use anvil_toolchain::EnvBlock;
use std::collections::HashSet;

const OUT_FLAG: &str = "/OUT:";

/// Environment variable the linker reads to pick its PDB server instance
pub const PDB_ENDPOINT_VAR: &str = "_MSPDBSRV_ENDPOINT_";

/// Extract the target of an output flag, if this argument is one
///
/// The flag prefix is matched case-insensitively; the target is returned
/// verbatim.
pub fn output_target(arg: &str) -> Option<&str> {
    let bytes = arg.as_bytes();
    if bytes.len() > OUT_FLAG.len() && bytes[..OUT_FLAG.len()].eq_ignore_ascii_case(OUT_FLAG.as_bytes())
    {
        Some(&arg[OUT_FLAG.len()..])
    } else {
        None
    }
}

/// All distinct output targets named in a link command, in argv order
pub fn output_targets(args: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    args.iter()
        .filter_map(|arg| output_target(arg))
        .filter(|target| seen.insert(*target))
        .collect()
}

/// Derive a private PDB server endpoint for this link, if one applies
///
/// Only direct `link.exe` invocations with an output flag get their own
/// server; anything else shares the default endpoint. The endpoint name is
/// the output path plus our process id, reduced to word characters so it is
/// a valid endpoint token.
pub fn pdb_server_endpoint(args: &[String]) -> Option<String> {
    let first = args.first()?;
    if first != "link.exe" {
        return None;
    }
    let out = args.iter().find_map(|arg| output_target(arg))?;
    let raw = format!("{}_{}", out, std::process::id());
    Some(
        raw.chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect(),
    )
}

/// Point the linker at a private PDB server instance when applicable
pub fn apply_pdb_server_endpoint(env: &mut EnvBlock, args: &[String]) {
    if let Some(endpoint) = pdb_server_endpoint(args) {
        env.set(PDB_ENDPOINT_VAR, endpoint);
    }
}
