//! The link-with-manifests pipeline
//!
//! One link unit of work runs as a fixed sequence: merge the supplied
//! manifest fragments into the authoritative manifest (optionally compiling
//! it into a resource the link embeds), run the link, then re-merge the
//! linker's own intermediate manifest with ours and compare. If the linker
//! would have contributed anything we were not told about, the output is
//! untrustworthy: it is deleted and the build fails loudly. Signing, when
//! configured, runs strictly last.
//!
//! Every external tool failure is returned as that tool's exit code,
//! unchanged and unretried; the first failure ends the pipeline.

use crate::error::{LinkError, LinkResult};
use crate::manifest::{self, ManifestMerger, ResourceId};
use crate::sign::SignConfig;
use anvil_toolchain::{filters, run_filtered, EnvBlock};
use std::fs;
use std::path::{Path, PathBuf};

/// A single merge → link → verify → sign unit of work
#[derive(Debug)]
pub struct LinkJob {
    env: EnvBlock,
    out: PathBuf,
    link_args: Vec<String>,
    mt: String,
    rc: String,
    intermediate_manifest: PathBuf,
    manifests: Vec<PathBuf>,
    embed_manifest: bool,
    resource_id: ResourceId,
    sign: Option<SignConfig>,
}

impl LinkJob {
    pub fn new(
        env: EnvBlock,
        out: impl Into<PathBuf>,
        link_args: Vec<String>,
        mt: impl Into<String>,
        rc: impl Into<String>,
        intermediate_manifest: impl Into<PathBuf>,
    ) -> Self {
        let out = out.into();
        let resource_id = ResourceId::for_output(&out);
        Self {
            env,
            out,
            link_args,
            mt: mt.into(),
            rc: rc.into(),
            intermediate_manifest: intermediate_manifest.into(),
            manifests: Vec::new(),
            embed_manifest: false,
            resource_id,
            sign: None,
        }
    }

    /// Set the manifest fragments to merge, in precedence order
    pub fn with_manifests(mut self, manifests: Vec<PathBuf>) -> Self {
        self.manifests = manifests;
        self
    }

    /// Embed the merged manifest as a compiled resource
    pub fn with_embedded_manifest(mut self, embed: bool) -> Self {
        self.embed_manifest = embed;
        self
    }

    /// Override the inferred resource id
    pub fn with_resource_id(mut self, id: ResourceId) -> Self {
        self.resource_id = id;
        self
    }

    /// Configure post-link signing
    pub fn with_sign(mut self, sign: Option<SignConfig>) -> Self {
        self.sign = sign;
        self
    }

    /// Run the pipeline; returns the final exit code
    ///
    /// With no manifest fragments, the merge and verify phases are skipped
    /// entirely and the result is exactly the link step's exit code.
    pub fn run(&self) -> LinkResult<i32> {
        let merged = suffixed(&self.out, "manifest");
        let merger = ManifestMerger::new(&self.mt, &self.env);

        let mut link_args = self.link_args.clone();
        if !self.manifests.is_empty() {
            let code = merger.merge(&self.manifests, &merged)?;
            if code != 0 {
                return Ok(code);
            }
            if self.embed_manifest {
                let script = suffixed(&self.out, "manifest.rc");
                let resource = suffixed(&self.out, "manifest.res");
                manifest::write_resource_script(&merged, &script, self.resource_id)?;
                let code = self.compile_resource(&script, &resource)?;
                if code != 0 {
                    return Ok(code);
                }
                link_args.push(resource.display().to_string());
            }
        }

        let code = run_filtered(&link_args, &self.env, filters::keep_linker_line)?;
        if code != 0 {
            return Ok(code);
        }

        if !self.manifests.is_empty() {
            let code = self.verify(&merger, &merged)?;
            if code != 0 {
                return Ok(code);
            }
        }

        if let Some(sign) = &self.sign {
            let out = self.out.display().to_string();
            let code = sign.sign_targets([out.as_str()])?;
            if code != 0 {
                return Ok(code);
            }
        }

        Ok(0)
    }

    fn compile_resource(&self, script: &Path, resource: &Path) -> LinkResult<i32> {
        let cmd = vec![
            self.rc.clone(),
            "/nologo".to_string(),
            format!("/fo{}", resource.display()),
            script.display().to_string(),
        ];
        Ok(run_filtered(&cmd, &self.env, filters::keep_rc_line)?)
    }

    /// Assert that the linker's manifest adds nothing to ours
    ///
    /// The linker was still told to generate its intermediate manifest; here
    /// it gets merged with the authoritative one into `<out>.assert.manifest`,
    /// and the two files must match byte-for-byte once all whitespace is
    /// stripped (the manifest tool is inconsistent about preserving it). A
    /// mismatch means a manifest source this build never declared — usually
    /// a /MANIFESTDEPENDENCY switch inside a #pragma comment.
    fn verify(&self, merger: &ManifestMerger, merged: &Path) -> LinkResult<i32> {
        let assert_path = suffixed(&self.out, "assert.manifest");
        let inputs = vec![merged.to_path_buf(), self.intermediate_manifest.clone()];
        let code = merger.merge(&inputs, &assert_path)?;
        if code != 0 {
            return Ok(code);
        }

        let ours = read(merged)?;
        let theirs = read(&assert_path)?;
        if strip_whitespace(&ours) == strip_whitespace(&theirs) {
            return Ok(0);
        }

        // The binary on disk does not match what we verified; remove it so
        // nothing downstream consumes it.
        fs::remove_file(&self.out).map_err(|error| LinkError::io(&self.out, error))?;

        dump(&self.intermediate_manifest);
        dump(merged);
        dump(&assert_path);
        eprintln!(
            "The linker-generated manifest \"{}\" added content to the merged manifest \
             \"{}\" (combined result in \"{}\"). Was a /MANIFESTDEPENDENCY switch used in \
             a #pragma comment without declaring the manifest as a link input?",
            self.intermediate_manifest.display(),
            merged.display(),
            assert_path.display(),
        );
        Ok(1)
    }
}

fn suffixed(out: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", out.display(), suffix))
}

fn read(path: &Path) -> LinkResult<Vec<u8>> {
    fs::read(path).map_err(|error| LinkError::io(path, error))
}

fn strip_whitespace(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect()
}

fn dump(path: &Path) {
    eprintln!("{}\n-----", path.display());
    match fs::read_to_string(path) {
        Ok(contents) => eprintln!("{contents}\n-----"),
        Err(error) => eprintln!("<unreadable: {error}>\n-----"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_suffixed_appends_to_full_name() {
        assert_eq!(
            suffixed(Path::new("out/ui.dll"), "manifest"),
            PathBuf::from("out/ui.dll.manifest")
        );
        assert_eq!(
            suffixed(Path::new("out/ui.dll"), "assert.manifest"),
            PathBuf::from("out/ui.dll.assert.manifest")
        );
    }

    #[test]
    fn test_strip_whitespace_removes_all_kinds() {
        let stripped = strip_whitespace(b"<a>\n  <b x=\"1\" />\r\n\t</a> ");
        assert_eq!(stripped, b"<a><bx=\"1\"/></a>".to_vec());
    }

    #[test]
    fn test_strip_whitespace_equality_is_insensitive_to_reformatting() {
        let compact = b"<assembly><file name=\"a\"/></assembly>".to_vec();
        let pretty = b"<assembly>\n  <file name=\"a\"/>\n</assembly>\n".to_vec();
        assert_eq!(strip_whitespace(&compact), strip_whitespace(&pretty));
    }
}
