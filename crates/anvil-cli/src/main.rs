use anyhow::Result;
use anvil_link::ResourceId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

mod commands;

/// Deterministic wrapper around the MSVC build toolchain.
///
/// A build graph invokes anvil sub-commands instead of the toolchain
/// binaries directly. Anvil restores the captured per-architecture
/// environment before each call, strips the banner and progress noise the
/// tools print so build logs diff cleanly, and verifies linker manifest
/// generation against its own deterministic merge.
///
/// Tool command lines are passed through verbatim after `--`:
///
/// EXAMPLES:
///     anvil stamp obj/ui.stamp
///     anvil link-wrapper environment.x64 -- link.exe /OUT:ui.dll ui.obj
///     anvil rc-wrapper environment.x86 -- rc.exe /fo app.res app.rc
///
/// ENVIRONMENT VARIABLES:
///     ANVIL_SIGN_TOOL   Signing tool invoked on linked dll/exe outputs
///     ANVIL_SIGN_KEY    Key arguments for the signing tool
#[derive(Parser)]
#[command(name = "anvil")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or truncate a stamp file
    Stamp {
        /// Path of the stamp file
        path: PathBuf,
    },

    /// Delete a file if it exists
    DeleteFile {
        /// Path of the file to delete
        path: PathBuf,
    },

    /// Replace a destination with a copy of a source file or tree
    ///
    /// The destination is removed first (clearing read-only bits where
    /// removal is refused), then the source is copied recursively.
    RecursiveMirror {
        /// File or directory to copy
        source: PathBuf,
        /// Destination to replace
        dest: PathBuf,
    },

    /// Run a link command with banner noise filtered
    ///
    /// Restores the captured environment, suppresses the export-library and
    /// code-generation progress lines, and signs the outputs when signing is
    /// configured.
    ///
    /// EXAMPLES:
    ///     anvil link-wrapper environment.x64 -- link.exe /OUT:ui.dll ui.obj
    LinkWrapper {
        /// Captured environment block for the target architecture
        env_file: PathBuf,
        /// Give this link its own PDB server instance
        #[arg(long)]
        mspdbsrv: bool,
        /// The link command line
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// Merge manifests, link, then verify the linker added nothing
    ///
    /// Merges the given manifest fragments into `<out>.manifest` before the
    /// link (optionally embedding it as a compiled resource), then re-merges
    /// the linker's intermediate manifest on the side and fails the build if
    /// the two disagree.
    ///
    /// EXAMPLES:
    ///     anvil link-with-manifests environment.x64 ui.dll \
    ///           --mt mt.exe --rc rc.exe \
    ///           --intermediate-manifest obj/ui.dll.intermediate.manifest \
    ///           --manifest ui.dll.manifest --embed \
    ///           -- link.exe /OUT:ui.dll /MANIFEST ui.obj
    LinkWithManifests {
        /// Captured environment block for the target architecture
        env_file: PathBuf,
        /// Link output path
        out: PathBuf,
        /// Manifest tool executable
        #[arg(long)]
        mt: String,
        /// Resource compiler executable
        #[arg(long)]
        rc: String,
        /// Manifest the linker generates for cross-checking
        #[arg(long)]
        intermediate_manifest: PathBuf,
        /// Manifest fragment to merge (repeatable, precedence order)
        #[arg(long = "manifest")]
        manifests: Vec<PathBuf>,
        /// Embed the merged manifest as a compiled resource
        #[arg(long)]
        embed: bool,
        /// Resource id for the embedded manifest (inferred from the output
        /// extension when omitted)
        #[arg(long)]
        resource_id: Option<ResourceId>,
        /// The link command line
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// Run the manifest tool with its spurious warning filtered
    ManifestWrapper {
        /// Captured environment block for the target architecture
        env_file: PathBuf,
        /// The manifest tool command line
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// Write a resource script embedding a manifest
    ManifestToRc {
        /// Captured environment block (accepted for a uniform surface)
        env_file: PathBuf,
        /// Manifest to embed
        manifest: PathBuf,
        /// Resource script to write
        output: PathBuf,
        /// Resource id: exe (1) or dll (2)
        resource_id: ResourceId,
    },

    /// Run the IDL compiler with its file chatter filtered
    MidlWrapper {
        /// Captured environment block for the target architecture
        env_file: PathBuf,
        /// Output directory
        outdir: String,
        /// Type library output
        tlb: String,
        /// Header output
        h: String,
        /// Dlldata output
        dlldata: String,
        /// Interface identifier output
        iid: String,
        /// Proxy output
        proxy: String,
        /// Input IDL file
        idl: String,
        /// Extra compiler flags
        #[arg(last = true)]
        flags: Vec<String>,
    },

    /// Run the assembler with its banner filtered
    AsmWrapper {
        /// Captured environment block for the target architecture
        env_file: PathBuf,
        /// The assembler command line
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// Run the resource compiler with its banner filtered
    RcWrapper {
        /// Captured environment block for the target architecture
        env_file: PathBuf,
        /// The resource compiler command line
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// Run a response-file action under the captured environment
    ///
    /// Ambient variables not present in the captured environment are
    /// overlaid so configure-time settings reach the action.
    ActionWrapper {
        /// Captured environment block for the target architecture
        env_file: PathBuf,
        /// Response file holding the command line
        rspfile: PathBuf,
        /// Working directory for the action
        cwd: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => process::exit(code),
        Err(error) => {
            eprintln!("anvil: {error:?}");
            process::exit(1);
        }
    }
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Stamp { path } => commands::fs::stamp(&path),
        Commands::DeleteFile { path } => commands::fs::delete_file(&path),
        Commands::RecursiveMirror { source, dest } => commands::fs::recursive_mirror(&source, &dest),
        Commands::LinkWrapper {
            env_file,
            mspdbsrv,
            args,
        } => commands::link::link_wrapper(commands::link::LinkWrapperArgs {
            env_file,
            mspdbsrv,
            args,
            sign: anvil_link::SignConfig::from_env(),
        }),
        Commands::LinkWithManifests {
            env_file,
            out,
            mt,
            rc,
            intermediate_manifest,
            manifests,
            embed,
            resource_id,
            args,
        } => commands::link::link_with_manifests(commands::link::LinkWithManifestsArgs {
            env_file,
            out,
            mt,
            rc,
            intermediate_manifest,
            manifests,
            embed,
            resource_id,
            args,
            sign: anvil_link::SignConfig::from_env(),
        }),
        Commands::ManifestWrapper { env_file, args } => {
            commands::wrappers::manifest_wrapper(&env_file, &args)
        }
        Commands::ManifestToRc {
            env_file: _,
            manifest,
            output,
            resource_id,
        } => commands::wrappers::manifest_to_rc(&manifest, &output, resource_id),
        Commands::MidlWrapper {
            env_file,
            outdir,
            tlb,
            h,
            dlldata,
            iid,
            proxy,
            idl,
            flags,
        } => commands::wrappers::midl_wrapper(commands::wrappers::MidlArgs {
            env_file,
            outdir,
            tlb,
            h,
            dlldata,
            iid,
            proxy,
            idl,
            flags,
        }),
        Commands::AsmWrapper { env_file, args } => commands::wrappers::asm_wrapper(&env_file, &args),
        Commands::RcWrapper { env_file, args } => commands::wrappers::rc_wrapper(&env_file, &args),
        Commands::ActionWrapper {
            env_file,
            rspfile,
            cwd,
        } => commands::action::run(commands::action::ActionArgs {
            env_file,
            rspfile,
            cwd,
            ambient: std::env::vars().collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_smoke() {
        // Verify the command surface parses
        let _cli = Cli::parse_from(["anvil", "stamp", "out.stamp"]);
    }

    #[test]
    fn test_every_command_token_resolves() {
        for args in [
            vec!["anvil", "stamp", "p"],
            vec!["anvil", "delete-file", "p"],
            vec!["anvil", "recursive-mirror", "a", "b"],
            vec!["anvil", "link-wrapper", "env.x64", "--", "link.exe"],
            vec![
                "anvil",
                "link-with-manifests",
                "env.x64",
                "ui.dll",
                "--mt",
                "mt.exe",
                "--rc",
                "rc.exe",
                "--intermediate-manifest",
                "i.manifest",
                "--",
                "link.exe",
            ],
            vec!["anvil", "manifest-wrapper", "env.x64", "--", "mt.exe"],
            vec!["anvil", "manifest-to-rc", "env.x64", "m", "o.rc", "exe"],
            vec![
                "anvil",
                "midl-wrapper",
                "env.x64",
                "gen",
                "f.tlb",
                "f.h",
                "f_data.c",
                "f_i.c",
                "f_p.c",
                "f.idl",
            ],
            vec!["anvil", "asm-wrapper", "env.x64", "--", "ml.exe"],
            vec!["anvil", "rc-wrapper", "env.x64", "--", "rc.exe"],
            vec!["anvil", "action-wrapper", "env.x64", "cmd.rsp"],
        ] {
            assert!(
                Cli::try_parse_from(args.iter().copied()).is_ok(),
                "failed to parse: {args:?}"
            );
        }
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["anvil", "explode"]).is_err());
    }

    #[test]
    fn test_no_command_is_rejected() {
        assert!(Cli::try_parse_from(["anvil"]).is_err());
    }

    #[test]
    fn test_tool_args_pass_through_verbatim() {
        let cli = Cli::parse_from([
            "anvil",
            "link-wrapper",
            "env.x64",
            "--",
            "link.exe",
            "/OUT:ui.dll",
            "-opt:ref",
            "ui.obj",
        ]);
        match cli.command {
            Commands::LinkWrapper { args, .. } => {
                assert_eq!(args, ["link.exe", "/OUT:ui.dll", "-opt:ref", "ui.obj"]);
            }
            _ => panic!("Expected LinkWrapper command"),
        }
    }

    #[test]
    fn test_link_wrapper_requires_a_command_line() {
        assert!(Cli::try_parse_from(["anvil", "link-wrapper", "env.x64"]).is_err());
    }

    #[test]
    fn test_link_with_manifests_collects_fragments() {
        let cli = Cli::parse_from([
            "anvil",
            "link-with-manifests",
            "env.x64",
            "ui.dll",
            "--mt",
            "mt.exe",
            "--rc",
            "rc.exe",
            "--intermediate-manifest",
            "i.manifest",
            "--manifest",
            "a.manifest",
            "--manifest",
            "b.manifest",
            "--embed",
            "--",
            "link.exe",
            "/OUT:ui.dll",
        ]);
        match cli.command {
            Commands::LinkWithManifests {
                manifests, embed, ..
            } => {
                assert_eq!(manifests.len(), 2);
                assert!(embed);
            }
            _ => panic!("Expected LinkWithManifests command"),
        }
    }

    #[test]
    fn test_resource_id_parses_aliases() {
        let cli = Cli::parse_from(["anvil", "manifest-to-rc", "env.x64", "m", "o.rc", "2"]);
        match cli.command {
            Commands::ManifestToRc { resource_id, .. } => {
                assert_eq!(resource_id, ResourceId::Dll);
            }
            _ => panic!("Expected ManifestToRc command"),
        }
    }
}
