use crate::cat::CatOptions;
use crate::diff::unified_diff;
use crate::CoreError;
use kyml_schema::{EnvName, MissingSnapshotPolicy};
use kyml_store::{SnapshotStore, DEFAULT_SNAPSHOT_FILE};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

const SNAPSHOT_LABEL: &str = "snapshot diff";
const CURRENT_LABEL: &str = "this diff";

#[derive(Debug, Clone)]
pub struct DriftOptions {
    pub name_main: EnvName,
    pub name_comparison: EnvName,
    pub snapshot_file: PathBuf,
    /// Overwrite the snapshot instead of failing on a mismatch.
    pub update: bool,
    pub missing_snapshot: MissingSnapshotPolicy,
    pub cat: CatOptions,
}

impl Default for DriftOptions {
    fn default() -> Self {
        Self {
            name_main: EnvName::new("main"),
            name_comparison: EnvName::new("comparison"),
            snapshot_file: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            update: false,
            missing_snapshot: MissingSnapshotPolicy::default(),
            cat: CatOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftOutcome {
    /// The recorded snapshot matches the current diff.
    Passed,
    /// No snapshot existed; the current diff was recorded.
    Created,
    /// The snapshot differed and was overwritten.
    Updated,
    /// The snapshot differs from the current diff.
    Mismatch,
}

impl DriftOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Mismatch)
    }
}

/// Result of one snapshot test run.
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub outcome: DriftOutcome,
    /// Diff between the two environments.
    pub diff: String,
    /// Diff between the recorded snapshot and `diff`; empty unless they differ.
    pub snapshot_diff: String,
}

/// Compare the diff between two canonical environment texts to the recorded
/// snapshot.
///
/// A missing snapshot is written when updating or under
/// [`MissingSnapshotPolicy::Create`]; otherwise it is an error. Nothing is
/// written on a mismatch unless `options.update` is set.
pub fn run_snapshot_test(
    store: &SnapshotStore<'_>,
    main_text: &str,
    comparison_text: &str,
    options: &DriftOptions,
) -> Result<DriftReport, CoreError> {
    let diff = unified_diff(
        &options.name_main,
        main_text,
        &options.name_comparison,
        comparison_text,
    );

    let Some(snapshot) = store.load()? else {
        if options.update || options.missing_snapshot == MissingSnapshotPolicy::Create {
            store.save(&diff)?;
            info!("created snapshot {}", store.path().display());
            return Ok(DriftReport {
                outcome: DriftOutcome::Created,
                diff,
                snapshot_diff: String::new(),
            });
        }
        return Err(CoreError::SnapshotMissing(
            store.path().display().to_string(),
        ));
    };

    let snapshot_diff = unified_diff(SNAPSHOT_LABEL, &snapshot, CURRENT_LABEL, &diff);
    let outcome = if snapshot_diff.is_empty() {
        info!("snapshot {} matches", store.path().display());
        DriftOutcome::Passed
    } else if options.update {
        store.save(&diff)?;
        info!("updated snapshot {}", store.path().display());
        DriftOutcome::Updated
    } else {
        DriftOutcome::Mismatch
    };

    Ok(DriftReport {
        outcome,
        diff,
        snapshot_diff,
    })
}
