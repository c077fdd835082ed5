//! Change inspector: reads the index and builds a [`ChangeReport`].

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::core::classifier::Classifier;
use crate::core::types::{ChangeReport, Inspection};
use crate::io::git::Git;

/// Abstraction over how staged changes are read.
///
/// Implementations must be side-effect free and safe to call repeatedly.
pub trait ChangeInspector: Send + Sync {
    fn inspect(&self) -> Result<Inspection>;
}

/// Inspector backed by `git diff --cached`.
#[derive(Debug, Clone)]
pub struct GitInspector {
    git: Git,
    classifier: Classifier,
}

impl GitInspector {
    pub fn new(git: Git, classifier: Classifier) -> Self {
        Self { git, classifier }
    }
}

impl ChangeInspector for GitInspector {
    #[instrument(skip_all, fields(workdir = %self.git.workdir().display()))]
    fn inspect(&self) -> Result<Inspection> {
        let paths = self.git.staged_paths()?;
        if paths.is_empty() {
            debug!("nothing staged");
            return Ok(Inspection::NoStagedChanges);
        }
        let classification = self.classifier.classify(&paths);
        if !classification.risky_paths.is_empty() {
            info!(
                risky = classification.risky_paths.len(),
                "risky paths are staged"
            );
        }
        let diff_text = self.git.staged_diff(&classification.artifact_paths)?;
        debug!(
            staged = paths.len(),
            excluded = classification.artifact_paths.len(),
            diff_bytes = diff_text.len(),
            "inspected staged changes"
        );
        Ok(Inspection::Staged(ChangeReport {
            diff_text,
            risky_paths: classification.risky_paths,
            excluded_artifacts: classification.artifact_paths,
        }))
    }
}
