//! Prompt construction for reproducibility assessment.
//!
//! The prompt embeds the submission verbatim and pins the reply to a raw JSON
//! object with `reproducibility_score`, `limitations` and `suggestions`.
//! Rendering is pure: identical inputs always produce identical text.
//!
//! Metadata is substituted directly. Text that imitates the `---` section
//! delimiters can blur the instruction boundary; this is not escaped.

use crate::submission::{CodeArtifact, SubmissionMetadata};

/// Default cap on embedded code, in characters.
pub const DEFAULT_MAX_CODE_CHARS: usize = 200_000;

/// Number of entries requested for each list in the reply.
pub const REQUESTED_MIN_ENTRIES: usize = 5;

/// Configuration for prompt rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    /// Code longer than this many characters is cut and marked.
    /// `None` embeds the code whole regardless of size.
    pub max_code_chars: Option<usize>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_code_chars: Some(DEFAULT_MAX_CODE_CHARS),
        }
    }
}

impl PromptConfig {
    pub fn with_max_code_chars(mut self, max: usize) -> Self {
        self.max_code_chars = Some(max);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.max_code_chars = None;
        self
    }
}

/// Renders the validator instruction prompt.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    config: PromptConfig,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PromptConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    /// Render the prompt for a submission.
    pub fn build(&self, metadata: &SubmissionMetadata, code: &CodeArtifact) -> String {
        let mut prompt = String::new();

        prompt.push_str("You are an AI Research Validator Agent.\n\n");
        prompt.push_str("Here is a user submission:\n");
        prompt.push_str("---\n");
        prompt.push_str("Metadata:\n");
        prompt.push_str(&format!("- Title: \"{}\"\n", metadata.title));
        prompt.push_str(&format!("- Author: {}\n", metadata.author));
        prompt.push_str(&format!("- Description: {}\n\n", metadata.description));
        prompt.push_str("Code:\n");
        prompt.push_str(&self.render_code(code));
        prompt.push_str("\n---\n\n");

        prompt.push_str(
            "Evaluate the submission and return a JSON object **only** with the following structure:\n\n",
        );
        prompt.push_str(OUTPUT_TEMPLATE);
        prompt.push('\n');

        prompt.push_str("DO NOT write explanations or full paragraphs.\n");
        prompt.push_str("DO NOT write prose or introduce the JSON.\n");
        prompt.push_str("DO NOT wrap the JSON in markdown code fences.\n");
        prompt.push_str("Return only a raw JSON object with arrays of strings.\n\n");
        prompt.push_str(&format!(
            "Give at least {} entries for both **limitations** and **suggestions**.\n",
            REQUESTED_MIN_ENTRIES
        ));

        prompt
    }

    fn render_code(&self, code: &CodeArtifact) -> String {
        let text = code.as_str();
        let Some(max) = self.config.max_code_chars else {
            return text.to_string();
        };

        match text.char_indices().nth(max) {
            None => text.to_string(),
            Some((byte_idx, _)) => {
                let total = code.char_len();
                format!(
                    "{}\n... [truncated: {} of {} characters omitted]",
                    &text[..byte_idx],
                    total - max,
                    total
                )
            }
        }
    }
}

const OUTPUT_TEMPLATE: &str = r#"{
  "reproducibility_score": <integer between 0 and 100>,
  "limitations": [
    "Limitation 1 (detailed, clear sentence)",
    "Limitation 2",
    ...
  ],
  "suggestions": [
    "Suggestion 1 (detailed, clear sentence)",
    "Suggestion 2",
    ...
  ]
}
"#;

/// Render a prompt with the default configuration.
pub fn build_prompt(metadata: &SubmissionMetadata, code: &CodeArtifact) -> String {
    PromptBuilder::new().build(metadata, code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn metadata() -> SubmissionMetadata {
        SubmissionMetadata::new(
            "Seed sensitivity of small CNNs",
            "A. Researcher",
            "We train 50 CNNs with different seeds.",
        )
    }

    #[test]
    fn test_prompt_embeds_submission() {
        let code = CodeArtifact::new("import torch\nprint(torch.__version__)");
        let prompt = build_prompt(&metadata(), &code);

        assert!(prompt.contains("- Title: \"Seed sensitivity of small CNNs\""));
        assert!(prompt.contains("- Author: A. Researcher"));
        assert!(prompt.contains("We train 50 CNNs with different seeds."));
        assert!(prompt.contains("import torch\nprint(torch.__version__)"));
    }

    #[test]
    fn test_prompt_specifies_schema() {
        let prompt = build_prompt(&metadata(), &CodeArtifact::default());

        assert!(prompt.contains("\"reproducibility_score\""));
        assert!(prompt.contains("\"limitations\""));
        assert!(prompt.contains("\"suggestions\""));
        assert!(prompt.contains("raw JSON object"));
        assert!(prompt.contains("at least 5 entries"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let code = CodeArtifact::new("fn main() {}");
        assert_eq!(
            build_prompt(&metadata(), &code),
            build_prompt(&metadata(), &code)
        );
    }

    #[test]
    fn test_long_code_is_truncated_with_marker() {
        let builder = PromptBuilder::with_config(PromptConfig::default().with_max_code_chars(10));
        let code = CodeArtifact::new("0123456789abcdef");
        let prompt = builder.build(&metadata(), &code);

        assert!(prompt.contains("0123456789\n... [truncated: 6 of 16 characters omitted]"));
        assert!(!prompt.contains("abcdef"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let builder = PromptBuilder::with_config(PromptConfig::default().with_max_code_chars(3));
        let prompt = builder.build(&metadata(), &CodeArtifact::new("ééééé"));

        assert!(prompt.contains("ééé\n... [truncated: 2 of 5 characters omitted]"));
    }

    #[test]
    fn test_unbounded_config_keeps_everything() {
        let builder = PromptBuilder::with_config(PromptConfig::default().unbounded());
        let code = "x".repeat(DEFAULT_MAX_CODE_CHARS + 10);
        let prompt = builder.build(&metadata(), &CodeArtifact::new(code.clone()));

        assert!(prompt.contains(&code));
        assert!(!prompt.contains("[truncated"));
    }

    proptest! {
        /// Inputs under the code cap appear verbatim in the prompt.
        #[test]
        fn prompt_contains_inputs_verbatim(
            title in ".*",
            author in ".*",
            description in ".*",
            code in ".*",
        ) {
            let meta = SubmissionMetadata::new(title.clone(), author.clone(), description.clone());
            let prompt = build_prompt(&meta, &CodeArtifact::new(code.clone()));

            prop_assert!(prompt.contains(&title));
            prop_assert!(prompt.contains(&author));
            prop_assert!(prompt.contains(&description));
            prop_assert!(prompt.contains(&code));
        }
    }
}
