//! Core pipeline for kyml.
//!
//! This crate ties together the schema codec, the file store, and image
//! resolution into the `Engine`: concatenating manifest sources with
//! deduplication and dependency ordering, snapshot testing the diff between
//! two environments, templating string values, and pinning container images.

pub mod cat;
pub mod diff;
pub mod drift;
pub mod engine;
pub mod merge;
pub mod order;
pub mod template;

pub use cat::{concatenate, concatenate_stream, CatOptions, Source};
pub use diff::unified_diff;
pub use drift::{run_snapshot_test, DriftOptions, DriftOutcome, DriftReport};
pub use engine::{Engine, ResolveRun, TestRun};
pub use merge::ManifestSet;
pub use order::{kind_rank, sort_by_dependencies, KIND_PRIORITY};
pub use template::{parse_assignment, render_documents, TemplateContext};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Schema(#[from] kyml_schema::SchemaError),
    #[error("store error: {0}")]
    Store(#[from] kyml_store::StoreError),
    #[error("image resolution error: {0}")]
    Resolve(#[from] kyml_resolve::ResolveError),
    #[error("cannot read {name}: {message}")]
    Input { name: String, message: String },
    #[error("template error in {field}: {message}")]
    Template { field: String, message: String },
    #[error("snapshot file does not exist: {0}")]
    SnapshotMissing(String),
}

impl CoreError {
    /// True for errors caused by the user's manifests, templates, or files
    /// rather than by the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Schema(_) | Self::Input { .. } | Self::Template { .. }
        )
    }
}
