//! Summary generator backends.
//!
//! The [`SummaryGenerator`] trait decouples the workflow from the service that
//! writes the message. Two backends ship: the Gemini `generateContent` HTTP API
//! and an arbitrary command that reads the prompt on stdin. Tests use scripted
//! generators that return predetermined text without network or processes.

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::io::config::{GeneratorBackend, GeneratorConfig};
use crate::io::process::{RunLimits, run_command};
use crate::tasks::CancelToken;

/// Abstraction over text generation backends.
pub trait SummaryGenerator: Send + Sync {
    /// Short name shown next to the suggestion ("Gemini suggested:").
    fn label(&self) -> &str;

    /// Produce raw text for `prompt`. Implementations should stop early when
    /// `cancel` fires, but the caller ignores late results either way.
    fn generate(&self, prompt: &str, cancel: &CancelToken) -> Result<String>;
}

/// Build the configured backend.
pub fn build_generator(cfg: &GeneratorConfig) -> Result<Arc<dyn SummaryGenerator>> {
    let timeout = cfg.timeout_secs.map(Duration::from_secs);
    Ok(match cfg.backend {
        GeneratorBackend::Gemini => Arc::new(GeminiGenerator::new(
            &cfg.api_base,
            &cfg.model,
            std::env::var(&cfg.api_key_env).ok(),
            &cfg.api_key_env,
            timeout,
        )?),
        GeneratorBackend::Command => Arc::new(CommandGenerator::new(
            cfg.command.clone(),
            RunLimits {
                timeout,
                output_limit_bytes: cfg.output_limit_bytes,
            },
        )?),
    })
}

/// Turn raw model output into a commit message.
///
/// Code fences are dropped and surrounding whitespace trimmed. With
/// `single_line`, only the first non-empty line is kept.
pub fn normalize_message(raw: &str, single_line: bool) -> String {
    let lines: Vec<&str> = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect();
    if single_line {
        return lines
            .iter()
            .map(|line| line.trim())
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string();
    }
    lines.join("\n").trim().to_string()
}

/// Generator that calls the Gemini `generateContent` endpoint.
pub struct GeminiGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
    api_key_env: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiGenerator {
    pub fn new(
        api_base: &str,
        model: &str,
        api_key: Option<String>,
        api_key_env: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                api_base.trim_end_matches('/'),
                model
            ),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env: api_key_env.to_string(),
        })
    }
}

impl SummaryGenerator for GeminiGenerator {
    fn label(&self) -> &str {
        "Gemini"
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint, prompt_bytes = prompt.len()))]
    fn generate(&self, prompt: &str, cancel: &CancelToken) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("{} is not set", self.api_key_env);
        };
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };
        info!("requesting commit message");
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .context("Gemini API request")?;
        if cancel.is_cancelled() {
            bail!("cancelled");
        }
        let status = response.status();
        let text = response.text().context("read Gemini API response")?;
        if !status.is_success() {
            info!(status = %status, "Gemini API returned an error");
            return Err(anyhow!("Gemini API error: {}", api_error_message(status, &text)));
        }
        let text = extract_text(&text)?;
        debug!(bytes = text.len(), "received generated text");
        Ok(text)
    }
}

fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => format!("{status}: {}", parsed.error.message),
        Err(_) => format!("{status}: {}", body.trim()),
    }
}

fn extract_text(body: &str) -> Result<String> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).context("parse Gemini API response")?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        bail!("no response from Gemini");
    }
    Ok(text)
}

/// Generator that pipes the prompt into a command and reads the message from stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    limits: RunLimits,
}

impl CommandGenerator {
    pub fn new(command: Vec<String>, limits: RunLimits) -> Result<Self> {
        let mut parts = command.into_iter();
        let program = parts
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| anyhow!("generator.command must be a non-empty array"))?;
        Ok(Self {
            program,
            args: parts.collect(),
            limits,
        })
    }
}

impl SummaryGenerator for CommandGenerator {
    fn label(&self) -> &str {
        &self.program
    }

    #[instrument(skip_all, fields(program = %self.program, prompt_bytes = prompt.len()))]
    fn generate(&self, prompt: &str, cancel: &CancelToken) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        let output = run_command(cmd, Some(prompt.as_bytes()), self.limits, cancel)
            .with_context(|| format!("run {}", self.program))?;
        if output.cancelled {
            bail!("cancelled");
        }
        if output.timed_out {
            bail!("{} timed out after {:?}", self.program, self.limits.timeout);
        }
        if !output.status.success() {
            return Err(anyhow!(
                "{} exited with status {:?}: {}",
                self.program,
                output.status.code(),
                output.stderr_lossy()
            ));
        }
        Ok(output.stdout_lossy())
    }
}
