//! Response-file action execution

use anyhow::{Context, Result};
use anvil_toolchain::{run_shell, EnvBlock};
use std::fs;
use std::path::PathBuf;

/// action-wrapper arguments
pub struct ActionArgs {
    pub env_file: PathBuf,
    pub rspfile: PathBuf,
    pub cwd: Option<PathBuf>,
    /// Ambient variables overlaid onto the captured environment; an
    /// explicit parameter so the overlay is decided by the caller, not
    /// read from global state here.
    pub ambient: Vec<(String, String)>,
}

/// Run an action command line from a response file
///
/// The response file holds one shell command line. The captured
/// architecture environment wins over the ambient overlay; ambient
/// variables only fill in what the capture does not define.
pub fn run(args: ActionArgs) -> Result<i32> {
    let mut env = EnvBlock::load(&args.env_file)
        .context("Failed to restore the architecture environment")?;
    env.overlay(args.ambient);

    let command = fs::read_to_string(&args.rspfile)
        .with_context(|| format!("Failed to read response file {}", args.rspfile.display()))?;

    Ok(run_shell(&command, &env, args.cwd.as_deref())?)
}
