//! Manifest document model, resource identity, YAML codec, and project configuration for kyml.
//!
//! This crate defines the schema layer: the polymorphic `Document` tree for
//! Kubernetes-style manifests, identity derivation (`ResourceId`,
//! `GroupVersionKind`), multi-document YAML decoding and canonical encoding
//! (`decode_str`, `encode`), and the optional `kyml.toml` project configuration.

pub mod codec;
pub mod config;
pub mod document;
pub mod identity;
pub mod types;

pub use codec::{decode_reader, decode_str, encode};
pub use config::{
    load_project_config, parse_config_file, parse_config_str, CatSection, MissingSnapshotPolicy,
    ProjectConfig, ResolveSection, TestSection, DEFAULT_CONFIG_FILE,
};
pub use document::Document;
pub use identity::{GroupVersionKind, ResourceId};
pub use types::{EnvName, ImageRef};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("manifest document {index} is not a mapping (found {found})")]
    NotAnObject { index: usize, found: &'static str },
    #[error("manifest document {index} has a {found} as a mapping key")]
    UnsupportedKey { index: usize, found: &'static str },
    #[error("failed to encode manifest: {0}")]
    Encode(String),
    #[error("failed to read config file: {0}")]
    ConfigIo(String),
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}
