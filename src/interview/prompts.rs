//! Prompts, the abstract outbound message of every turn.

use serde::{Deserialize, Serialize};

use super::model::{QuestionTemplate, SectionTemplate};

/// Title of the prompt listing the available templates.
pub const SELECT_TEMPLATE_TITLE: &str = "Please select a template";

/// Title of the prompt sent after a response has been finalized.
pub const COMPLETION_TITLE: &str = "Thank you! Your responses have been recorded.";

/// An outbound prompt: a title, an optional subtitle and zero or more
/// selectable options. No options means the user answers in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
}

impl Prompt {
    /// Build a prompt. Options are kept verbatim and in order.
    pub fn build<I, S>(title: impl Into<String>, subtitle: Option<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            subtitle,
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the prompt expects a free-text answer.
    pub fn is_free_text(&self) -> bool {
        self.options.is_empty()
    }

    /// Render as plain text for line-oriented channels.
    pub fn to_text(&self) -> String {
        let mut lines = vec![self.title.clone()];
        if let Some(ref subtitle) = self.subtitle {
            lines.push(format!("({subtitle})"));
        }
        for (i, option) in self.options.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, option));
        }
        lines.join("\n")
    }
}

/// Prompt for a question: the question text titled under its section.
pub fn question_prompt(section: &SectionTemplate, question: &QuestionTemplate) -> Prompt {
    Prompt::build(
        question.text.as_str(),
        Some(section.name().to_string()),
        question.options.iter().map(String::as_str),
    )
}

/// Prompt asking the user to pick one of `names`.
pub fn template_selection_prompt<I, S>(names: I) -> Prompt
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Prompt::build(SELECT_TEMPLATE_TITLE, None, names)
}

/// Prompt acknowledging a finalized interview.
pub fn completion_prompt(template_name: &str) -> Prompt {
    Prompt::build(
        COMPLETION_TITLE,
        Some(template_name.to_string()),
        std::iter::empty::<String>(),
    )
}
