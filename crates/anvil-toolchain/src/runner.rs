//! Child process execution with output filtering
//!
//! All toolchain invocations go through here. The child runs with the
//! restored architecture environment (nothing is inherited), its standard
//! error is merged into standard output through a single pipe, and the
//! combined stream is re-emitted line by line through a keep-predicate.
//! Streaming matters: a link step can produce gigabytes of output, and
//! buffering it would exhaust memory.

use crate::envblock::EnvBlock;
use crate::error::{ToolchainError, ToolchainResult};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a command, filter its combined output to standard output
///
/// Returns the child's exit code. Lines for which `keep` returns false are
/// suppressed; everything else is re-emitted in arrival order.
pub fn run_filtered<F>(argv: &[String], env: &EnvBlock, keep: F) -> ToolchainResult<i32>
where
    F: FnMut(&str) -> bool,
{
    run_filtered_to(argv, env, keep, &mut io::stdout().lock())
}

/// Run a command, filter its combined output into `sink`
pub fn run_filtered_to<F, W>(
    argv: &[String],
    env: &EnvBlock,
    mut keep: F,
    sink: &mut W,
) -> ToolchainResult<i32>
where
    F: FnMut(&str) -> bool,
    W: Write,
{
    let (reader, mut child) = spawn_merged(argv, env)?;
    for line in BufReader::new(reader).lines() {
        let line = line?;
        if keep(&line) {
            writeln!(sink, "{line}")?;
        }
    }
    let status = child.wait()?;
    Ok(status.code().unwrap_or(1))
}

/// Run a command, buffer its combined output
///
/// Returns the exit code and the full output. Only for tools whose filtering
/// is inherently two-pass (MIDL); everything else streams.
pub fn run_captured(argv: &[String], env: &EnvBlock) -> ToolchainResult<(i32, String)> {
    let (mut reader, mut child) = spawn_merged(argv, env)?;
    let mut output = String::new();
    reader.read_to_string(&mut output)?;
    let status = child.wait()?;
    Ok((status.code().unwrap_or(1), output))
}

/// Run a single-string command line through the platform shell
///
/// Response-file actions hand us one string, which only a shell can split;
/// vector invocations never come through here. Output is not filtered and
/// the child inherits our standard streams.
pub fn run_shell(command: &str, env: &EnvBlock, cwd: Option<&Path>) -> ToolchainResult<i32> {
    let mut cmd = shell_command(command);
    cmd.env_clear().envs(env.vars());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let status = cmd
        .status()
        .map_err(|error| ToolchainError::spawn(SHELL, error))?;
    Ok(status.code().unwrap_or(1))
}

fn spawn_merged(
    argv: &[String],
    env: &EnvBlock,
) -> ToolchainResult<(io::PipeReader, std::process::Child)> {
    let (program, args) = argv.split_first().ok_or(ToolchainError::EmptyCommand)?;
    let program = native_program_path(program);
    let (reader, writer) = io::pipe()?;
    // Both writer handles move into the temporary Command, which drops at the
    // end of this statement; the reader then sees EOF exactly when the child
    // closes its side.
    let child = Command::new(&program)
        .args(args)
        .env_clear()
        .envs(env.vars())
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer)
        .spawn()
        .map_err(|error| ToolchainError::spawn(&*program, error))?;
    Ok((reader, child))
}

/// Normalize the program path for the native launcher
///
/// The Windows process launcher requires backslash separators in the image
/// path; forward slashes arrive from the build graph's portable rules.
#[cfg(windows)]
fn native_program_path(program: &str) -> String {
    program.replace('/', "\\")
}

#[cfg(not(windows))]
fn native_program_path(program: &str) -> String {
    program.to_string()
}

#[cfg(windows)]
const SHELL: &str = "cmd";
#[cfg(not(windows))]
const SHELL: &str = "sh";

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    use std::os::windows::process::CommandExt;
    let mut cmd = Command::new(SHELL);
    cmd.arg("/c").raw_arg(line);
    cmd
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new(SHELL);
    cmd.arg("-c").arg(line);
    cmd
}
