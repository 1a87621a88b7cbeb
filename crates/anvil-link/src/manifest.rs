//! Manifest merging and resource embedding
//!
//! The real XML merge semantics (fragment precedence, namespace handling)
//! belong to the external manifest tool; this module only sequences file
//! paths into its argument list and synthesizes the tiny resource script
//! that carries the merged manifest into the binary.

use crate::error::{LinkError, LinkResult};
use anvil_toolchain::{filters, run_filtered, EnvBlock};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Resource type identifier for an embedded manifest
///
/// The loader looks a manifest up under resource id 1 in executables and
/// id 2 in dynamic libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceId {
    Executable,
    Dll,
}

impl ResourceId {
    /// Resource identifier as it appears in the resource script
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Executable => "1",
            Self::Dll => "2",
        }
    }

    /// Infer the resource id from the link output's extension
    pub fn for_output(out: &Path) -> Self {
        match out.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("exe") => Self::Executable,
            _ => Self::Dll,
        }
    }
}

impl FromStr for ResourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exe" | "1" => Ok(Self::Executable),
            "dll" | "2" => Ok(Self::Dll),
            other => Err(format!(
                "invalid resource id '{other}': expected exe, dll, 1, or 2"
            )),
        }
    }
}

/// Drives the external manifest tool against a restored environment
#[derive(Debug)]
pub struct ManifestMerger<'a> {
    mt: &'a str,
    env: &'a EnvBlock,
}

impl<'a> ManifestMerger<'a> {
    pub fn new(mt: &'a str, env: &'a EnvBlock) -> Self {
        Self { mt, env }
    }

    /// Merge manifest fragments into a single manifest at `out`
    ///
    /// An empty fragment set succeeds immediately without spawning the tool.
    /// Returns the tool's exit code; fragment order is passed through
    /// verbatim because it carries the tool's precedence rules.
    pub fn merge(&self, fragments: &[PathBuf], out: &Path) -> LinkResult<i32> {
        if fragments.is_empty() {
            return Ok(0);
        }
        let mut cmd = vec![
            self.mt.to_string(),
            "-nologo".to_string(),
            "-manifest".to_string(),
        ];
        cmd.extend(fragments.iter().map(|p| p.display().to_string()));
        cmd.push(format!("-out:{}", out.display()));
        Ok(run_filtered(&cmd, self.env, filters::keep_manifest_line)?)
    }
}

/// Write a resource script embedding `manifest` under `id`
///
/// The script is compiled by the resource compiler and linked in, so the
/// manifest ships inside the binary instead of as a side-car file. The
/// manifest path is absolutized and written with forward slashes, which the
/// resource compiler accepts on every host.
pub fn write_resource_script(
    manifest: &Path,
    rc_path: &Path,
    id: ResourceId,
) -> LinkResult<()> {
    let abs = std::path::absolute(manifest).map_err(|error| LinkError::io(manifest, error))?;
    let embedded = abs.display().to_string().replace('\\', "/");
    let contents = format!(
        "#include <windows.h>\n{} RT_MANIFEST \"{}\"",
        id.as_str(),
        embedded
    );
    fs::write(rc_path, contents).map_err(|error| LinkError::resource_script(rc_path, error))
}
