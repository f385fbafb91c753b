//! Generation prompt templates.
//!
//! Templates live in `prompts/` at the project root and use `{context}`
//! and `{question}` placeholders. Built-in copies are used when the files
//! are not present.

use std::path::PathBuf;

use crate::{Error, Result};

const GROUNDED_ANSWER: &str = "\
The following is relevant information about some entities:
{context}

Based on this information, answer the following question in a clear, friendly and structured way:
Question: {question}

Organize the answer in clear, separate paragraphs for each entity, and add context about its cultural, geographic or linguistic importance.

Answer:
";

/// Available prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Answer grounded in retrieved entity context.
    GroundedAnswer,
}

impl Prompt {
    /// Prompt file name (Markdown).
    pub fn filename(&self) -> &'static str {
        match self {
            Prompt::GroundedAnswer => "grounded_answer.md",
        }
    }

    /// Built-in template.
    pub fn builtin(&self) -> &'static str {
        match self {
            Prompt::GroundedAnswer => GROUNDED_ANSWER,
        }
    }

    /// Load the prompt from file.
    pub fn load(&self) -> Result<String> {
        load_prompt(self.filename())
    }

    /// Load from file, falling back to the built-in template.
    pub fn load_or_builtin(&self) -> String {
        self.load().unwrap_or_else(|_| self.builtin().to_string())
    }
}

/// Load a prompt by file name.
pub fn load_prompt(filename: &str) -> Result<String> {
    let path = prompts_dir().join(filename);
    std::fs::read_to_string(&path)
        .map_err(|e| Error::InvalidArgument(format!("Cannot load prompt {}: {}", filename, e)))
}

/// Prompt directory, searched relative to the working directory.
pub fn prompts_dir() -> PathBuf {
    let candidates = [PathBuf::from("prompts"), PathBuf::from("../prompts")];

    for path in candidates {
        if path.exists() {
            return path;
        }
    }

    PathBuf::from("prompts")
}

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUESTION_PLACEHOLDER: &str = "{question}";

/// Fill `{context}` and `{question}` placeholders in a single pass over the
/// template. Substituted text is never scanned again.
pub fn render(template: &str, context: &str, question: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(QUESTION_PLACEHOLDER) {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// All known prompts.
pub fn list_prompts() -> Vec<Prompt> {
    vec![Prompt::GroundedAnswer]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_filenames() {
        assert_eq!(Prompt::GroundedAnswer.filename(), "grounded_answer.md");
        for prompt in list_prompts() {
            assert!(prompt.filename().ends_with(".md"));
        }
    }

    #[test]
    fn builtin_template_has_placeholders() {
        let template = Prompt::GroundedAnswer.builtin();
        assert!(template.contains("{context}"));
        assert!(template.contains("{question}"));
    }

    #[test]
    fn render_fills_both_placeholders() {
        let out = render("C={context} Q={question}", "ctx", "why?");
        assert_eq!(out, "C=ctx Q=why?");
    }

    #[test]
    fn render_does_not_expand_placeholders_inside_context() {
        let out = render("{context}|{question}", "literal {question}", "q");
        assert_eq!(out, "literal {question}|q");
    }

    #[test]
    fn render_does_not_expand_placeholders_inside_question() {
        let out = render("{context}|{question}", "Entity: Aymara", "what is {context}?");
        assert_eq!(out, "Entity: Aymara|what is {context}?");
    }

    #[test]
    fn render_keeps_other_braces_and_repeated_placeholders() {
        let out = render("{x} {question} {{context}} {question}", "c", "q");
        assert_eq!(out, "{x} q {c} q");
    }

    #[test]
    fn load_or_builtin_always_has_placeholders() {
        let template = Prompt::GroundedAnswer.load_or_builtin();
        assert!(template.contains("{context}"));
    }

    #[test]
    fn missing_prompt_file_is_an_error() {
        assert!(load_prompt("does_not_exist_123.md").is_err());
    }
}
