/// Link pipeline error types
use anvil_toolchain::ToolchainError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type LinkResult<T> = Result<T, LinkError>;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("Failed to write resource script at {path}: {error}")]
    ResourceScript { path: PathBuf, error: io::Error },

    #[error("Failed to launch signing tool {tool}: {error}")]
    SignLaunch { tool: String, error: io::Error },

    #[error("I/O error at {path}: {error}")]
    Io { path: PathBuf, error: io::Error },
}

impl LinkError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    /// Create a resource script write error
    pub fn resource_script(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self::ResourceScript {
            path: path.into(),
            error,
        }
    }

    /// Create a signing tool launch error
    pub fn sign_launch(tool: impl Into<String>, error: io::Error) -> Self {
        Self::SignLaunch {
            tool: tool.into(),
            error,
        }
    }
}
