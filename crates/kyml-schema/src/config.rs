use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Project configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "kyml.toml";

/// Optional defaults for kyml subcommands. Command-line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub cat: CatSection,
    #[serde(default)]
    pub test: TestSection,
    #[serde(default)]
    pub resolve: ResolveSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CatSection {
    #[serde(default)]
    pub sort: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TestSection {
    #[serde(default)]
    pub snapshot_file: Option<String>,
    #[serde(default)]
    pub name_main: Option<String>,
    #[serde(default)]
    pub name_comparison: Option<String>,
    #[serde(default)]
    pub missing_snapshot: Option<MissingSnapshotPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResolveSection {
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
}

/// What a snapshot test does when no snapshot file exists and no update was requested.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingSnapshotPolicy {
    /// Fail and ask for an explicit update.
    #[default]
    Fail,
    /// Write the current diff as the first snapshot and pass.
    Create,
}

impl fmt::Display for MissingSnapshotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => f.write_str("fail"),
            Self::Create => f.write_str("create"),
        }
    }
}

pub fn parse_config_str(input: &str) -> Result<ProjectConfig, SchemaError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_config_file(path: impl AsRef<Path>) -> Result<ProjectConfig, SchemaError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| SchemaError::ConfigIo(format!("{}: {e}", path.display())))?;
    parse_config_str(&content)
}

/// Load the project configuration.
///
/// An explicit path must exist. Without one, `kyml.toml` in `dir` is used if
/// present and built-in defaults otherwise.
pub fn load_project_config(
    explicit: Option<&Path>,
    dir: &Path,
) -> Result<ProjectConfig, SchemaError> {
    if let Some(path) = explicit {
        debug!("loading config from {}", path.display());
        return parse_config_file(path);
    }
    let default_path = dir.join(DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        debug!("loading config from {}", default_path.display());
        parse_config_file(&default_path)
    } else {
        Ok(ProjectConfig::default())
    }
}
