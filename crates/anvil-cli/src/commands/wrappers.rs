//! Filter wrappers for the manifest tool, IDL compiler, assembler, and
//! resource compiler

use anyhow::{Context, Result};
use anvil_link::{manifest, ResourceId};
use anvil_toolchain::{filters, run_captured, run_filtered, EnvBlock};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn load_env(env_file: &Path) -> Result<EnvBlock> {
    EnvBlock::load(env_file).context("Failed to restore the architecture environment")
}

/// Run the manifest tool, dropping its spurious authoring warning
pub fn manifest_wrapper(env_file: &Path, args: &[String]) -> Result<i32> {
    let env = load_env(env_file)?;
    Ok(run_filtered(args, &env, filters::keep_manifest_line)?)
}

/// Write a resource script embedding a manifest
pub fn manifest_to_rc(manifest_path: &Path, output: &Path, id: ResourceId) -> Result<i32> {
    manifest::write_resource_script(manifest_path, output, id)?;
    Ok(0)
}

/// midl-wrapper arguments
pub struct MidlArgs {
    pub env_file: PathBuf,
    pub outdir: String,
    pub tlb: String,
    pub h: String,
    pub dlldata: String,
    pub iid: String,
    pub proxy: String,
    pub idl: String,
    pub flags: Vec<String>,
}

/// Run the IDL compiler and strip its per-file chatter
///
/// The chatter is not quietable from the command line, and the bare
/// filename echoes can only be recognized once the `Processing` lines have
/// been seen, so this wrapper buffers instead of streaming. IDL output is
/// small; the multi-gigabyte concern belongs to the linker.
pub fn midl_wrapper(args: MidlArgs) -> Result<i32> {
    let env = load_env(&args.env_file)?;
    let mut cmd = vec!["midl".to_string(), "/nologo".to_string()];
    cmd.extend(args.flags);
    cmd.extend(
        [
            "/out",
            args.outdir.as_str(),
            "/tlb",
            args.tlb.as_str(),
            "/h",
            args.h.as_str(),
            "/dlldata",
            args.dlldata.as_str(),
            "/iid",
            args.iid.as_str(),
            "/proxy",
            args.proxy.as_str(),
            args.idl.as_str(),
        ]
        .map(str::to_string),
    );

    let (code, raw) = run_captured(&cmd, &env)?;
    let mut stdout = io::stdout().lock();
    for line in filters::filter_midl_output(&raw) {
        writeln!(stdout, "{line}")?;
    }
    Ok(code)
}

/// Run the assembler with its banner filtered
pub fn asm_wrapper(env_file: &Path, args: &[String]) -> Result<i32> {
    let env = load_env(env_file)?;
    Ok(run_filtered(args, &env, filters::keep_asm_line)?)
}

/// Run the resource compiler with its banner filtered
pub fn rc_wrapper(env_file: &Path, args: &[String]) -> Result<i32> {
    let env = load_env(env_file)?;
    Ok(run_filtered(args, &env, filters::keep_rc_line)?)
}
