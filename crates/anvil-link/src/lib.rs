//! Manifest-merged, verified linking
//!
//! The linker's own manifest handling merges linker-generated dependencies
//! with manifest sources and then relinks, which breaks incremental linking
//! and silently drifts. Anvil instead merges every manifest up front,
//! embeds the result into the one and only link, and afterwards re-merges
//! the linker's intermediate manifest on the side to assert that the simpler
//! process missed nothing. This crate owns that protocol, plus the optional
//! post-link signing hook.

pub mod argv;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod sign;

// Re-export main types
pub use error::{LinkError, LinkResult};
pub use manifest::{write_resource_script, ManifestMerger, ResourceId};
pub use orchestrator::LinkJob;
pub use sign::SignConfig;
