//! Image tag to content digest resolution for kyml.
//!
//! This crate implements the resolution layer: a pluggable `CommandRunner`
//! capability (real processes or a scripted mock), the two docker-based
//! lookup strategies (`docker inspect` for locally present images, then
//! `docker manifest inspect` against the registry), platform selection for
//! multi-platform manifest lists, a per-run memoizing resolver, and the pass
//! that pins container images inside workload manifests.

pub mod command;
pub mod containers;
pub mod docker;
pub mod mock;
pub mod reference;
pub mod resolver;

pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use containers::{is_supported_kind, resolve_documents, SUPPORTED_KINDS};
pub use docker::{DockerResolver, Platform};
pub use mock::MockRunner;
pub use reference::strip_tag_and_digest;
pub use resolver::{CachingResolver, ImageResolver};

use kyml_schema::ImageRef;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{program}: failed to run: {message}")]
    Spawn { program: String, message: String },
    #[error("{tool}: exited unsuccessfully (stderr: {stderr})")]
    ToolFailed { tool: String, stderr: String },
    #[error("{tool}: cannot decode output: {message}")]
    Decode { tool: String, message: String },
    #[error("image {0} not found")]
    ImageNotFound(ImageRef),
    #[error("mock runner has no scripted response for: {0}")]
    Unscripted(String),
}
