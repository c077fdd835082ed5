//! gemmit: write a commit message for the staged changes and commit them.
//!
//! Runs an interactive workflow in the terminal. Exits 0 when the commit is
//! made or the user cancels, 1 when anything fails.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::debug;

use gemmit::core::classifier::Classifier;
use gemmit::core::machine::Machine;
use gemmit::core::prompt::{PromptBuilder, PromptHints};
use gemmit::driver::{Collaborators, Driver, DriverOptions};
use gemmit::exit_codes;
use gemmit::io::committer::GitCommitter;
use gemmit::io::config::{GemmitConfig, GeneratorBackend, load_config, resolve_config_path};
use gemmit::io::generator::build_generator;
use gemmit::io::git::Git;
use gemmit::io::inspector::GitInspector;
use gemmit::io::terminal::run_interactive;
use gemmit::logging;
use gemmit::render::Theme;

#[derive(Parser, Debug)]
#[command(
    name = "gemmit",
    version,
    about = "Generate a commit message for staged changes and commit it"
)]
struct Cli {
    /// Config file (default: `.gemmit.toml` at the repository root).
    #[arg(long, env = "GEMMIT_CONFIG")]
    config: Option<PathBuf>,

    /// Override `generator.model`.
    #[arg(long)]
    model: Option<String>,

    /// Override `generator.backend`.
    #[arg(long, value_enum)]
    backend: Option<GeneratorBackend>,

    /// Word the commit message should start with.
    #[arg(short, long)]
    start: Option<String>,

    /// Words the commit message should include.
    #[arg(short, long, num_args = 1..)]
    include: Vec<String>,

    /// Write diagnostics here instead of stderr (filtered by `RUST_LOG`).
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILED);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref())?;

    let cwd = env::current_dir().context("read current directory")?;
    // Outside a repository the inspector reports the git error in the Error view.
    let git = Git::discover(&cwd).unwrap_or_else(|err| {
        debug!(err = %format!("{err:#}"), "repository discovery failed");
        Git::new(&cwd)
    });

    let config_path = resolve_config_path(cli.config.as_deref(), git.workdir());
    let mut cfg = load_config(config_path.as_deref())?;
    apply_overrides(&mut cfg, &cli);
    cfg.validate()?;
    debug!(?config_path, backend = ?cfg.generator.backend, "configuration loaded");

    let generator = build_generator(&cfg.generator)?;
    let color = cfg.ui.color && env::var_os("NO_COLOR").is_none();
    let theme = Theme::new(color, generator.label());

    let classifier = Classifier::new(
        &cfg.inspect.extra_risky_prefixes,
        &cfg.inspect.extra_artifacts,
    );
    let machine = Machine::new(PromptBuilder::new(PromptHints {
        start_word: cli.start,
        include_words: cli.include,
    }));
    let collaborators = Collaborators {
        inspector: Arc::new(GitInspector::new(git.clone(), classifier)),
        generator,
        committer: Arc::new(GitCommitter::new(git)),
    };
    let driver = Driver::new(
        machine,
        collaborators,
        DriverOptions {
            spinner_interval: Duration::from_millis(cfg.ui.spinner_interval_ms),
            single_line: cfg.generator.single_line,
        },
    );

    let model = run_interactive(driver, theme)?;
    let outcome = model
        .outcome()
        .ok_or_else(|| anyhow!("workflow stopped in {:?}", model.state))?;
    Ok(exit_codes::for_outcome(&outcome))
}

fn apply_overrides(cfg: &mut GemmitConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        cfg.generator.model = model.clone();
    }
    if let Some(backend) = cli.backend {
        cfg.generator.backend = backend;
    }
}
