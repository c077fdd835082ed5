use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gemmit::core::classifier::Classifier;
use gemmit::core::machine::Machine;
use gemmit::core::types::{Completion, Input, Inspection, WorkflowState};
use gemmit::driver::{Collaborators, Driver, DriverOptions};
use gemmit::io::committer::{CommitApplier, GitCommitter};
use gemmit::io::generator::{CommandGenerator, SummaryGenerator};
use gemmit::io::git::Git;
use gemmit::io::inspector::{ChangeInspector, GitInspector};
use gemmit::io::process::RunLimits;
use gemmit::tasks::CancelToken;
use gemmit::test_support::{Cue, ScriptedGenerator, ScriptedSurface, TestRepo};

fn inspector(repo: &TestRepo) -> GitInspector {
    GitInspector::new(Git::new(repo.path()), Classifier::default())
}

fn staged(inspection: Inspection) -> gemmit::core::types::ChangeReport {
    match inspection {
        Inspection::Staged(report) => report,
        Inspection::NoStagedChanges => panic!("expected staged changes"),
    }
}

#[test]
fn empty_index_reports_nothing_staged() {
    let repo = TestRepo::init().expect("repo");
    repo.write("src/main.go", "package main\n").expect("write");

    let inspection = inspector(&repo).inspect().expect("inspect");
    assert_eq!(inspection, Inspection::NoStagedChanges);
}

#[test]
fn lock_files_are_left_out_of_the_diff() {
    let repo = TestRepo::init().expect("repo");
    repo.stage("src/main.go", "package main\n\nfunc main() {}\n")
        .expect("stage");
    repo.stage("go.sum", "example.com/mod v1.0.0 h1:abc=\n")
        .expect("stage");

    let report = staged(inspector(&repo).inspect().expect("inspect"));

    assert_eq!(report.excluded_artifacts, vec!["go.sum".to_string()]);
    assert!(report.risky_paths.is_empty());
    assert!(report.diff_text.contains("src/main.go"));
    assert!(!report.diff_text.contains("go.sum"));
    assert!(!report.diff_text.contains("h1:abc="));
}

#[test]
fn nested_lock_files_are_excluded_by_full_path() {
    let repo = TestRepo::init().expect("repo");
    repo.stage("web/yarn.lock", "# yarn lockfile v1\n").expect("stage");
    repo.stage("web/index.js", "console.log(1);\n").expect("stage");

    let report = staged(inspector(&repo).inspect().expect("inspect"));

    assert_eq!(report.excluded_artifacts, vec!["web/yarn.lock".to_string()]);
    assert!(report.diff_text.contains("web/index.js"));
    assert!(!report.diff_text.contains("yarn lockfile"));
}

#[test]
fn risky_directories_are_flagged_but_kept_in_the_diff() {
    let repo = TestRepo::init().expect("repo");
    repo.stage("node_modules/foo.js", "module.exports = 1;\n")
        .expect("stage");

    let report = staged(inspector(&repo).inspect().expect("inspect"));

    assert_eq!(report.risky_paths, vec!["node_modules/foo.js".to_string()]);
    assert!(report.diff_text.contains("node_modules/foo.js"));
}

#[test]
fn configured_extras_extend_the_built_in_lists() {
    let repo = TestRepo::init().expect("repo");
    repo.stage("target/debug/out.txt", "x\n").expect("stage");
    repo.stage("flake.lock", "{}\n").expect("stage");
    let classifier = Classifier::new(&["target/".to_string()], &["flake.lock".to_string()]);

    let report = staged(
        GitInspector::new(Git::new(repo.path()), classifier)
            .inspect()
            .expect("inspect"),
    );

    assert_eq!(report.risky_paths, vec!["target/debug/out.txt".to_string()]);
    assert_eq!(report.excluded_artifacts, vec!["flake.lock".to_string()]);
}

#[test]
fn inspection_outside_a_repository_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = GitInspector::new(Git::new(dir.path()), Classifier::default())
        .inspect()
        .expect_err("not a repo");
    assert!(format!("{err:#}").contains("git diff"));
}

#[test]
fn committer_records_the_exact_message() {
    let repo = TestRepo::init().expect("repo");
    repo.stage("README.md", "hello\n").expect("stage");
    let git = Git::new(repo.path());

    GitCommitter::new(git.clone())
        .commit("docs: add readme")
        .expect("commit");

    assert_eq!(git.head_subject().expect("subject"), "docs: add readme");
    assert_eq!(repo.commit_count(), 1);
}

#[test]
fn committer_rejects_empty_messages() {
    let repo = TestRepo::init().expect("repo");
    repo.stage("README.md", "hello\n").expect("stage");

    let err = GitCommitter::new(Git::new(repo.path()))
        .commit("   ")
        .expect_err("empty");
    assert!(err.to_string().contains("empty message"));
    assert_eq!(repo.commit_count(), 0);
}

#[test]
fn discover_finds_the_top_level_from_a_subdirectory() {
    let repo = TestRepo::init().expect("repo");
    repo.write("src/lib.rs", "").expect("write");
    let git = Git::discover(&repo.path().join("src")).expect("discover");
    let expected = repo.path().canonicalize().expect("canonicalize");
    assert_eq!(git.workdir().canonicalize().expect("canonicalize"), expected);
}

#[test]
fn full_run_commits_generated_message() {
    let repo = TestRepo::init().expect("repo");
    repo.stage("src/main.go", "package main\n").expect("stage");
    repo.stage("go.sum", "example.com/mod v1.0.0 h1:abc=\n")
        .expect("stage");
    let git = Git::new(repo.path());
    let generator = ScriptedGenerator::replying("fix: correct null check");

    let driver = Driver::new(
        Machine::default(),
        Collaborators {
            inspector: Arc::new(GitInspector::new(git.clone(), Classifier::default())),
            generator: Arc::new(generator.clone()),
            committer: Arc::new(GitCommitter::new(git.clone())),
        },
        DriverOptions {
            spinner_interval: Duration::from_millis(5),
            single_line: true,
        },
    );
    let mut surface = ScriptedSurface::new(driver.sender()).on(Cue::Confirm, Input::Affirm);
    let model = driver.run(&mut surface).expect("run");

    assert_eq!(model.state, WorkflowState::Done(Completion::Committed));
    assert_eq!(git.head_subject().expect("subject"), "fix: correct null check");
    let prompt = generator.prompts().remove(0);
    assert!(prompt.contains("(diff not shown): go.sum"));
    assert!(!prompt.contains("h1:abc="));
    // Excluded artifacts are still part of the commit.
    let files = repo
        .git(&["show", "--name-only", "--format=", "HEAD"])
        .expect("show");
    assert!(files.lines().any(|line| line == "go.sum"));
}

#[cfg(unix)]
#[test]
fn cancel_during_a_slow_hook_keeps_the_commit() {
    use std::os::unix::fs::PermissionsExt;

    let repo = TestRepo::init().expect("repo");
    repo.stage("src/main.go", "package main\n").expect("stage");
    let hook = repo.path().join(".git/hooks/pre-commit");
    std::fs::create_dir_all(hook.parent().expect("hooks dir")).expect("mkdir");
    std::fs::write(&hook, "#!/bin/sh\nsleep 1\n").expect("write hook");
    std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    let git = Git::new(repo.path());

    let driver = Driver::new(
        Machine::default(),
        Collaborators {
            inspector: Arc::new(GitInspector::new(git.clone(), Classifier::default())),
            generator: Arc::new(ScriptedGenerator::replying("feat: slow hook")),
            committer: Arc::new(GitCommitter::new(git.clone())),
        },
        DriverOptions {
            spinner_interval: Duration::from_millis(5),
            single_line: true,
        },
    );
    let mut surface = ScriptedSurface::new(driver.sender())
        .on(Cue::Confirm, Input::Affirm)
        .on(Cue::Committing, Input::Cancel);
    let model = driver.run(&mut surface).expect("run");

    assert_eq!(model.state, WorkflowState::Done(Completion::Committed));
    assert_eq!(repo.commit_count(), 1);
    assert_eq!(git.head_subject().expect("subject"), "feat: slow hook");
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut out) = self.0.lock() {
            out.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// The default filter is `warn` on stderr, which shares the screen with the
/// prompts; expected situations must stay below it.
#[cfg(unix)]
#[test]
fn expected_situations_log_below_warn() {
    let repo = TestRepo::init().expect("repo");
    repo.stage("node_modules/foo.js", "module.exports = 1;\n")
        .expect("stage");
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let report = staged(inspector(&repo).inspect().expect("inspect"));
        assert_eq!(report.risky_paths, vec!["node_modules/foo.js".to_string()]);

        let generator = CommandGenerator::new(
            vec!["sh".to_string(), "-c".to_string(), "exec sleep 30".to_string()],
            RunLimits {
                timeout: Some(Duration::from_millis(100)),
                output_limit_bytes: 1024,
            },
        )
        .expect("build");
        generator
            .generate(&"x".repeat(256 * 1024), &CancelToken::new())
            .expect_err("timeout");
    });

    let logged = captured.0.lock().map(|out| out.clone()).unwrap_or_default();
    assert_eq!(String::from_utf8_lossy(&logged), "");
}
