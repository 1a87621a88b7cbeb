//! Link commands - filtered linking and the manifest-verified pipeline

use anyhow::{Context, Result};
use anvil_link::{argv, LinkJob, ResourceId, SignConfig};
use anvil_toolchain::{filters, run_filtered, EnvBlock};
use std::path::PathBuf;

/// link-wrapper arguments
pub struct LinkWrapperArgs {
    pub env_file: PathBuf,
    pub mspdbsrv: bool,
    pub args: Vec<String>,
    pub sign: Option<SignConfig>,
}

/// Run a plain link command with banner filtering and optional signing
pub fn link_wrapper(args: LinkWrapperArgs) -> Result<i32> {
    let mut env = EnvBlock::load(&args.env_file)
        .context("Failed to restore the architecture environment")?;
    if args.mspdbsrv {
        argv::apply_pdb_server_endpoint(&mut env, &args.args);
    }

    let code = run_filtered(&args.args, &env, filters::keep_linker_line)?;
    if code != 0 {
        return Ok(code);
    }

    if let Some(sign) = &args.sign {
        let targets = argv::output_targets(&args.args);
        return Ok(sign.sign_targets(targets)?);
    }
    Ok(0)
}

/// link-with-manifests arguments
pub struct LinkWithManifestsArgs {
    pub env_file: PathBuf,
    pub out: PathBuf,
    pub mt: String,
    pub rc: String,
    pub intermediate_manifest: PathBuf,
    pub manifests: Vec<PathBuf>,
    pub embed: bool,
    pub resource_id: Option<ResourceId>,
    pub args: Vec<String>,
    pub sign: Option<SignConfig>,
}

/// Run the merge → link → verify → sign pipeline
pub fn link_with_manifests(args: LinkWithManifestsArgs) -> Result<i32> {
    let env = EnvBlock::load(&args.env_file)
        .context("Failed to restore the architecture environment")?;

    let mut job = LinkJob::new(
        env,
        &args.out,
        args.args,
        args.mt,
        args.rc,
        args.intermediate_manifest,
    )
    .with_manifests(args.manifests)
    .with_embedded_manifest(args.embed)
    .with_sign(args.sign);
    if let Some(id) = args.resource_id {
        job = job.with_resource_id(id);
    }

    Ok(job.run()?)
}
