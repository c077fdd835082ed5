//! User configuration, read from `.gemmit.toml` or an explicit path.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Config file looked up at the repository top level when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".gemmit.toml";

/// gemmit configuration (TOML).
///
/// Missing fields default to the behaviour of a bare `gemmit` invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GemmitConfig {
    pub generator: GeneratorConfig,
    pub inspect: InspectConfig,
    pub ui: UiConfig,
}

/// Which service writes the message.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    /// Gemini `generateContent` HTTP API.
    #[default]
    Gemini,
    /// Any command reading the prompt on stdin and printing the message.
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub backend: GeneratorBackend,

    /// Gemini model name.
    pub model: String,

    /// Gemini API base URL.
    pub api_base: String,

    /// Environment variable holding the Gemini API key.
    pub api_key_env: String,

    /// Command for the `command` backend (e.g. `["ollama","run","llama3"]`).
    pub command: Vec<String>,

    /// Give up on generation after this many seconds. Unset waits indefinitely.
    pub timeout_secs: Option<u64>,

    /// Keep only the first line of the generated text.
    pub single_line: bool,

    /// Truncate command backend output beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: GeneratorBackend::Gemini,
            model: "gemini-2.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            command: Vec::new(),
            timeout_secs: None,
            single_line: true,
            output_limit_bytes: 100_000,
        }
    }
}

/// Extra entries for the inspector's built-in lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InspectConfig {
    /// Additional directory prefixes that trigger the warning prompt.
    pub extra_risky_prefixes: Vec<String>,
    /// Additional dependency artifact file names to leave out of the prompt.
    pub extra_artifacts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    /// Spinner frame interval.
    pub spinner_interval_ms: u64,
    /// Styled output. Disabled automatically when `NO_COLOR` is set.
    pub color: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            spinner_interval_ms: 100,
            color: true,
        }
    }
}

impl GemmitConfig {
    pub fn validate(&self) -> Result<()> {
        let generator = &self.generator;
        match generator.backend {
            GeneratorBackend::Gemini => {
                if generator.model.trim().is_empty() {
                    return Err(anyhow!("generator.model must not be empty"));
                }
                if generator.api_base.trim().is_empty() {
                    return Err(anyhow!("generator.api_base must not be empty"));
                }
                if generator.api_key_env.trim().is_empty() {
                    return Err(anyhow!("generator.api_key_env must not be empty"));
                }
            }
            GeneratorBackend::Command => {
                if generator.command.is_empty() || generator.command[0].trim().is_empty() {
                    return Err(anyhow!("generator.command must be a non-empty array"));
                }
            }
        }
        if generator.timeout_secs == Some(0) {
            return Err(anyhow!("generator.timeout_secs must be > 0"));
        }
        if generator.output_limit_bytes == 0 {
            return Err(anyhow!("generator.output_limit_bytes must be > 0"));
        }
        if self.ui.spinner_interval_ms == 0 {
            return Err(anyhow!("ui.spinner_interval_ms must be > 0"));
        }
        Ok(())
    }
}

/// Pick the config file: an explicit path wins, then `.gemmit.toml` at the repo root.
pub fn resolve_config_path(explicit: Option<&Path>, repo_root: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let candidate = repo_root.join(DEFAULT_CONFIG_FILE);
    candidate.exists().then_some(candidate)
}

/// Load config from a TOML file.
///
/// If `path` is `None`, returns `GemmitConfig::default()`. A path that cannot
/// be read is an error, so a mistyped `--config` is never silently ignored.
/// The result is not validated; callers apply CLI overrides first.
pub fn load_config(path: Option<&Path>) -> Result<GemmitConfig> {
    let Some(path) = path else {
        return Ok(GemmitConfig::default());
    };
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GemmitConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_returns_default() {
        let cfg = load_config(None).expect("load");
        assert_eq!(cfg, GemmitConfig::default());
        cfg.validate().expect("default config is valid");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("missing.toml");
        let err = load_config(Some(&path)).expect_err("missing file");
        assert!(format!("{err:#}").contains("missing.toml"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("gemmit.toml");
        fs::write(
            &path,
            "[generator]\nbackend = \"command\"\ncommand = [\"ollama\", \"run\", \"llama3\"]\ntimeout_secs = 60\n\n[inspect]\nextra_artifacts = [\"flake.lock\"]\n",
        )
        .expect("write");
        let cfg = load_config(Some(&path)).expect("load");
        assert_eq!(cfg.generator.backend, GeneratorBackend::Command);
        assert_eq!(cfg.generator.command[0], "ollama");
        assert_eq!(cfg.generator.timeout_secs, Some(60));
        assert!(cfg.generator.single_line);
        assert_eq!(cfg.inspect.extra_artifacts, vec!["flake.lock".to_string()]);
        assert_eq!(cfg.ui, UiConfig::default());
        cfg.validate().expect("valid");
    }

    #[test]
    fn command_backend_requires_command() {
        let mut cfg = GemmitConfig::default();
        cfg.generator.backend = GeneratorBackend::Command;
        let err = cfg.validate().expect_err("invalid");
        assert!(err.to_string().contains("generator.command"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = GemmitConfig::default();
        cfg.generator.timeout_secs = Some(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_file_reports_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("bad.toml");
        fs::write(&path, "[generator\n").expect("write");
        let err = load_config(Some(&path)).expect_err("parse error");
        assert!(format!("{err:#}").contains("bad.toml"));
    }

    #[test]
    fn explicit_path_wins_over_repo_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join(DEFAULT_CONFIG_FILE), "").expect("write");
        let explicit = temp.path().join("other.toml");
        assert_eq!(
            resolve_config_path(Some(&explicit), temp.path()),
            Some(explicit.clone())
        );
        assert_eq!(
            resolve_config_path(None, temp.path()),
            Some(temp.path().join(DEFAULT_CONFIG_FILE))
        );
        let empty = tempfile::tempdir().expect("tempdir");
        assert_eq!(resolve_config_path(None, empty.path()), None);
    }
}
