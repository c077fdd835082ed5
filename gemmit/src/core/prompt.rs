//! Prompt rendering for the summary generator.
//!
//! The prompt is the fixed instruction preamble, optional user hints, an
//! optional note naming excluded dependency artifacts, then the staged diff.

use anyhow::Result;
use minijinja::{Environment, context};

use crate::core::types::ChangeReport;

const COMMIT_TEMPLATE: &str = include_str!("prompts/commit.md");

/// Optional steering supplied on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptHints {
    /// Word the message should start with.
    pub start_word: Option<String>,
    /// Words the message should mention.
    pub include_words: Vec<String>,
}

/// Template engine wrapper around minijinja.
#[derive(Debug)]
pub struct PromptBuilder {
    env: Environment<'static>,
    hints: PromptHints,
}

impl PromptBuilder {
    pub fn new(hints: PromptHints) -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.add_template("commit", COMMIT_TEMPLATE)
            .expect("commit template should be valid");
        Self { env, hints }
    }

    /// Render the generator prompt for `report`.
    pub fn render(&self, report: &ChangeReport) -> Result<String> {
        let template = self.env.get_template("commit")?;
        let start_word = self
            .hints
            .start_word
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let include_words: Vec<&str> = self
            .hints
            .include_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .collect();
        let rendered = template.render(context! {
            start_word => start_word,
            include_words => include_words,
            excluded_artifacts => report.excluded_artifacts,
            diff => report.diff_text,
        })?;
        Ok(rendered)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(PromptHints::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE_END: &str = "no explanations or formatting:\n";

    fn report(diff: &str, excluded: &[&str]) -> ChangeReport {
        ChangeReport {
            diff_text: diff.to_string(),
            risky_paths: Vec::new(),
            excluded_artifacts: excluded.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn plain_prompt_is_preamble_blank_line_then_diff() {
        let prompt = PromptBuilder::default()
            .render(&report("diff --git a/x b/x", &[]))
            .expect("render");
        assert!(prompt.starts_with("Generate a concise conventional commit message"));
        assert!(prompt.ends_with(&format!("{PREAMBLE_END}\ndiff --git a/x b/x")));
        assert!(!prompt.contains("Note:"));
    }

    #[test]
    fn artifact_note_sits_between_preamble_and_diff() {
        let prompt = PromptBuilder::default()
            .render(&report("DIFF", &["go.sum", "yarn.lock"]))
            .expect("render");
        let expected = format!(
            "{PREAMBLE_END}\nNote: The following lock/dependency files were also changed (diff not shown): go.sum, yarn.lock\n\nDIFF"
        );
        assert!(prompt.ends_with(&expected), "prompt was:\n{prompt}");
    }

    #[test]
    fn hints_are_rendered_before_the_diff() {
        let builder = PromptBuilder::new(PromptHints {
            start_word: Some("feat".to_string()),
            include_words: vec!["parser".to_string(), " ".to_string(), "cache".to_string()],
        });
        let prompt = builder.render(&report("DIFF", &[])).expect("render");
        let start = prompt.find("Start the message with the word \"feat\".").expect("start");
        let include = prompt
            .find("Make sure the message mentions: parser, cache.")
            .expect("include");
        let diff = prompt.rfind("DIFF").expect("diff");
        assert!(start < include && include < diff);
    }

    #[test]
    fn diff_text_is_not_interpreted_as_template() {
        let prompt = PromptBuilder::default()
            .render(&report("+let s = \"{{ name }}\";", &[]))
            .expect("render");
        assert!(prompt.contains("{{ name }}"));
    }
}
