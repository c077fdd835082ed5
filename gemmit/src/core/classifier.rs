//! Deterministic classification of staged paths.
//!
//! Two fixed lists drive the inspector: directory prefixes that should almost
//! never be committed (they trigger the warning prompt) and dependency
//! artifacts whose diffs are noise for summarisation (they are left out of the
//! prompt and reported by name instead).

use std::path::{Component, Path};

/// Directory prefixes that trigger the warning prompt.
pub const RISKY_PREFIXES: &[&str] = &["node_modules/", ".direnv/"];

/// Lock/manifest files whose diff is never sent to the generator.
pub const DEPENDENCY_ARTIFACTS: &[&str] = &[
    "go.sum",
    "go.mod",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lock",
    "Cargo.lock",
    "poetry.lock",
    "uv.lock",
    "Gemfile.lock",
];

/// Staged paths split by how the inspector must treat them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Paths under a risky prefix. Still part of the diff.
    pub risky_paths: Vec<String>,
    /// Paths naming a dependency artifact. Excluded from the diff.
    pub artifact_paths: Vec<String>,
}

/// Path classifier built from the fixed lists plus configured extras.
#[derive(Debug, Clone)]
pub struct Classifier {
    risky_prefixes: Vec<Vec<String>>,
    artifacts: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&[], &[])
    }
}

impl Classifier {
    /// Extend the built-in lists. Blank entries are ignored.
    pub fn new(extra_risky_prefixes: &[String], extra_artifacts: &[String]) -> Self {
        let risky_prefixes = RISKY_PREFIXES
            .iter()
            .map(|p| p.to_string())
            .chain(extra_risky_prefixes.iter().cloned())
            .map(|prefix| prefix_segments(&prefix))
            .filter(|segments| !segments.is_empty())
            .collect();
        let artifacts = DEPENDENCY_ARTIFACTS
            .iter()
            .map(|a| a.to_string())
            .chain(
                extra_artifacts
                    .iter()
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty()),
            )
            .collect();
        Self {
            risky_prefixes,
            artifacts,
        }
    }

    /// Classify `paths` (repository-relative, `/`-separated), preserving input order
    /// and dropping duplicates.
    pub fn classify<S: AsRef<str>>(&self, paths: &[S]) -> Classification {
        let mut out = Classification::default();
        for path in paths {
            let path = path.as_ref();
            if self.is_artifact(path) && !out.artifact_paths.iter().any(|p| p == path) {
                out.artifact_paths.push(path.to_string());
            }
            if self.is_risky(path) && !out.risky_paths.iter().any(|p| p == path) {
                out.risky_paths.push(path.to_string());
            }
        }
        out
    }

    /// True if a directory component sequence of `path` matches a risky prefix.
    pub fn is_risky(&self, path: &str) -> bool {
        let dirs = directory_components(path);
        self.risky_prefixes.iter().any(|segments| {
            dirs.len() >= segments.len()
                && dirs
                    .windows(segments.len())
                    .any(|window| window.iter().zip(segments).all(|(a, b)| *a == b.as_str()))
        })
    }

    /// True if the file name of `path` is a known dependency artifact.
    pub fn is_artifact(&self, path: &str) -> bool {
        Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.artifacts.iter().any(|a| a == name))
    }
}

fn prefix_segments(prefix: &str) -> Vec<String> {
    prefix
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
        .collect()
}

fn directory_components(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = Path::new(path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();
    // The last component is the file itself.
    parts.pop();
    parts
}
