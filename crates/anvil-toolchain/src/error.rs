/// Toolchain error types
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type ToolchainResult<T> = Result<T, ToolchainError>;

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("Failed to read environment block at {path}: {error}")]
    EnvBlockRead { path: PathBuf, error: io::Error },

    #[error("Empty command line: nothing to execute")]
    EmptyCommand,

    #[error("Failed to launch {program}: {error}")]
    Spawn { program: String, error: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ToolchainError {
    /// Create an environment block read error
    pub fn env_block_read(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self::EnvBlockRead {
            path: path.into(),
            error,
        }
    }

    /// Create a process launch error
    pub fn spawn(program: impl Into<String>, error: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            error,
        }
    }
}
