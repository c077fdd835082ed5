//! Git adapter.
//!
//! A small, explicit wrapper around `git` subprocess calls. All commands run at
//! the repository top level so staged paths and pathspecs agree.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, instrument};

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Locate the repository containing `dir` and return a wrapper rooted at its top level.
    #[instrument(skip_all)]
    pub fn discover(dir: &Path) -> Result<Self> {
        let probe = Self::new(dir);
        let out = probe
            .run_capture(&["rev-parse", "--show-toplevel"])
            .context("not a git repository")?;
        let top = out.trim();
        if top.is_empty() {
            bail!("not a git repository: {}", dir.display());
        }
        debug!(toplevel = %top, "discovered repository");
        Ok(Self::new(top))
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Staged paths in index order (`git diff --cached --name-only`).
    pub fn staged_paths(&self) -> Result<Vec<String>> {
        let out = self.run_capture(&["diff", "--cached", "--name-only", "-z"])?;
        Ok(out
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Staged diff with `excluded` paths left out.
    pub fn staged_diff(&self, excluded: &[String]) -> Result<String> {
        let mut args: Vec<String> = ["diff", "--cached", "--no-color", "--no-ext-diff", "--", "."]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.extend(excluded.iter().map(|path| exclude_pathspec(path)));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run_capture(&args)
    }

    /// Commit staged changes with exactly `message`.
    #[instrument(skip_all)]
    pub fn commit(&self, message: &str) -> Result<()> {
        if message.trim().is_empty() {
            bail!("refusing to commit with an empty message");
        }
        debug!("committing staged changes");
        self.run_checked(&["commit", "--quiet", "-m", message])?;
        Ok(())
    }

    /// Subject line of `HEAD`.
    pub fn head_subject(&self) -> Result<String> {
        let out = self.run_capture(&["log", "-1", "--format=%s"])?;
        Ok(out.trim().to_string())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "git {} failed: {}",
                summarize_args(args),
                stderr.trim()
            ));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", summarize_args(args)))
    }
}

/// Pathspec that excludes exactly `path`, with glob characters taken literally.
fn exclude_pathspec(path: &str) -> String {
    format!(":(exclude,literal){path}")
}

/// First two args only; commit messages and pathspec lists make noisy errors.
fn summarize_args(args: &[&str]) -> String {
    args.iter().take(2).copied().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclude_pathspec_is_literal() {
        assert_eq!(exclude_pathspec("go.sum"), ":(exclude,literal)go.sum");
        assert_eq!(
            exclude_pathspec("web/[id]/yarn.lock"),
            ":(exclude,literal)web/[id]/yarn.lock"
        );
    }

    #[test]
    fn error_context_keeps_message_out() {
        assert_eq!(
            summarize_args(&["commit", "--quiet", "-m", "secret"]),
            "commit --quiet"
        );
    }
}
