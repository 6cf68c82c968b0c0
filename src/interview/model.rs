//! Template and response documents.
//!
//! Templates arrive as `TemplateDefinition` documents and only become
//! `ConversationTemplate`s after validation, so a template held by the
//! catalog always has at least one section and every section at least one
//! question. Field names on the wire follow the PascalCase document format
//! used by template authors and by stored responses.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Declared answer kind of a question. Carried through, never enforced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseType {
    #[default]
    FreeText,
    SingleSelect,
    MultiSelect,
    Other(String),
}

impl From<String> for ResponseType {
    fn from(raw: String) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "" | "freetext" | "text" => Self::FreeText,
            "singleselect" | "choice" => Self::SingleSelect,
            "multiselect" => Self::MultiSelect,
            _ => Self::Other(raw),
        }
    }
}

impl From<ResponseType> for String {
    fn from(kind: ResponseType) -> Self {
        kind.to_string()
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FreeText => write!(f, "free-text"),
            Self::SingleSelect => write!(f, "single-select"),
            Self::MultiSelect => write!(f, "multi-select"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

// ── Definitions (as authored) ───────────────────────────────────────────

/// A template document as written by its author, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDefinition {
    #[serde(rename = "TemplateName")]
    pub name: String,
    #[serde(rename = "Sections")]
    pub sections: Vec<SectionDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionDefinition {
    #[serde(rename = "SectionName")]
    pub name: String,
    #[serde(rename = "Questions")]
    pub questions: Vec<QuestionTemplate>,
}

// ── Validated templates ─────────────────────────────────────────────────

/// A single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTemplate {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "QuestionText")]
    pub text: String,
    #[serde(rename = "ResponseType", default)]
    pub response_type: ResponseType,
    #[serde(rename = "Options", default)]
    pub options: Vec<String>,
}

impl QuestionTemplate {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            response_type: ResponseType::FreeText,
            options: Vec::new(),
        }
    }

    /// Turn this into a single-select question offering `options`.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self.response_type = ResponseType::SingleSelect;
        self
    }
}

/// An ordered, non-empty group of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionTemplate {
    #[serde(rename = "SectionName")]
    name: String,
    #[serde(rename = "Questions")]
    questions: Vec<QuestionTemplate>,
}

impl SectionTemplate {
    /// Validate and build a section belonging to `template`.
    pub fn new(
        template: &str,
        name: impl Into<String>,
        questions: Vec<QuestionTemplate>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::EmptySectionName {
                template: template.to_string(),
            });
        }
        if questions.is_empty() {
            return Err(CatalogError::NoQuestions {
                template: template.to_string(),
                section: name,
            });
        }
        let mut seen = HashSet::new();
        for question in &questions {
            if question.id.trim().is_empty() {
                return Err(CatalogError::EmptyQuestionId {
                    template: template.to_string(),
                    section: name,
                });
            }
            if !seen.insert(question.id.as_str()) {
                return Err(CatalogError::DuplicateQuestionId {
                    template: template.to_string(),
                    section: name.clone(),
                    id: question.id.clone(),
                });
            }
        }
        Ok(Self { name, questions })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn questions(&self) -> &[QuestionTemplate] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&QuestionTemplate> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// A named interview: ordered, non-empty sections of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TemplateDefinition")]
pub struct ConversationTemplate {
    #[serde(rename = "TemplateName")]
    name: String,
    #[serde(rename = "Sections")]
    sections: Vec<SectionTemplate>,
}

impl ConversationTemplate {
    pub fn new(name: impl Into<String>, sections: Vec<SectionTemplate>) -> Result<Self, CatalogError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::EmptyTemplateName);
        }
        if sections.is_empty() {
            return Err(CatalogError::NoSections { template: name });
        }
        Ok(Self { name, sections })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sections(&self) -> &[SectionTemplate] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&SectionTemplate> {
        self.sections.get(index)
    }

    /// Total number of questions across all sections.
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(SectionTemplate::len).sum()
    }
}

impl TryFrom<TemplateDefinition> for ConversationTemplate {
    type Error = CatalogError;

    fn try_from(def: TemplateDefinition) -> Result<Self, Self::Error> {
        if def.name.trim().is_empty() {
            return Err(CatalogError::EmptyTemplateName);
        }
        let sections = def
            .sections
            .into_iter()
            .map(|s| SectionTemplate::new(&def.name, s.name, s.questions))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(def.name, sections)
    }
}

// ── Responses ───────────────────────────────────────────────────────────

/// The answer recorded for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Response")]
    pub response: String,
}

/// Answers collected for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionResponse {
    #[serde(rename = "SectionName")]
    pub section_name: String,
    #[serde(rename = "QuestionResponses")]
    pub question_responses: Vec<QuestionResponse>,
}

impl SectionResponse {
    pub fn new(section_name: impl Into<String>) -> Self {
        Self {
            section_name: section_name.into(),
            question_responses: Vec::new(),
        }
    }
}

/// The full response document for one completed interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationResponse {
    #[serde(rename = "TemplateName")]
    pub template_name: String,
    #[serde(rename = "SectionResponses")]
    pub section_responses: Vec<SectionResponse>,
}

impl ConversationResponse {
    pub fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            section_responses: Vec::new(),
        }
    }

    /// Number of answers across all sealed sections.
    pub fn answer_count(&self) -> usize {
        self.section_responses
            .iter()
            .map(|s| s.question_responses.len())
            .sum()
    }
}
