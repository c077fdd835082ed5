//! Commit applier: records the accepted message.

use anyhow::Result;
use tracing::{info, instrument};

use crate::io::git::Git;

/// Abstraction over how an accepted message is committed.
///
/// Called at most once per run, never retried.
pub trait CommitApplier: Send + Sync {
    fn commit(&self, message: &str) -> Result<()>;
}

/// Applier backed by `git commit -m`.
#[derive(Debug, Clone)]
pub struct GitCommitter {
    git: Git,
}

impl GitCommitter {
    pub fn new(git: Git) -> Self {
        Self { git }
    }
}

impl CommitApplier for GitCommitter {
    #[instrument(skip_all)]
    fn commit(&self, message: &str) -> Result<()> {
        self.git.commit(message)?;
        info!("commit recorded");
        Ok(())
    }
}
