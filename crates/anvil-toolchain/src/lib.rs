//! Captured-environment process execution for Anvil tool wrappers
//!
//! Provides the plumbing every Anvil sub-command is built on:
//! - Architecture environment blocks captured by the build configuration
//!   step, restored before each toolchain invocation
//! - Child process execution with merged, line-filtered output streaming
//! - Suppression predicates for the banner/progress noise the Microsoft
//!   tools emit on standard output

pub mod envblock;
pub mod error;
pub mod filters;
pub mod runner;

// Re-export main types
pub use envblock::EnvBlock;
pub use error::{ToolchainError, ToolchainResult};
pub use runner::{run_captured, run_filtered, run_filtered_to, run_shell};
