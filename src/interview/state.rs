//! Interview state machine: where a conversation is inside its template.
//!
//! A session is either `Idle` (no template chosen) or `SectionActive` (a
//! question of the current section is waiting for an answer). `step` is the
//! whole transition table; it never performs I/O, so finalization is
//! returned as an effect for the caller to carry out.

use std::sync::Arc;

use serde::Serialize;

use super::catalog::TemplateCatalog;
use super::model::{
    ConversationResponse, ConversationTemplate, QuestionResponse, QuestionTemplate,
    SectionResponse, SectionTemplate,
};
use super::prompts::{completion_prompt, question_prompt, template_selection_prompt, Prompt};

/// Coarse phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPhase {
    Idle,
    SectionActive,
}

impl std::fmt::Display for InterviewPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::SectionActive => "section_active",
        };
        write!(f, "{s}")
    }
}

/// Progress through a selected template.
///
/// `section_response` holds exactly `question_index` answers and `response`
/// holds exactly `section_index` sealed sections.
#[derive(Debug, Clone)]
pub struct ActiveInterview {
    template: Arc<ConversationTemplate>,
    section_index: usize,
    question_index: usize,
    section_response: SectionResponse,
    response: ConversationResponse,
}

impl ActiveInterview {
    /// Begin `template` at its first question.
    pub fn start(template: Arc<ConversationTemplate>) -> Self {
        let first_section = template.sections()[0].name().to_string();
        let response = ConversationResponse::new(template.name());
        Self {
            template,
            section_index: 0,
            question_index: 0,
            section_response: SectionResponse::new(first_section),
            response,
        }
    }

    pub fn template(&self) -> &Arc<ConversationTemplate> {
        &self.template
    }

    pub fn section_index(&self) -> usize {
        self.section_index
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn section_response(&self) -> &SectionResponse {
        &self.section_response
    }

    pub fn response(&self) -> &ConversationResponse {
        &self.response
    }

    pub fn current_section(&self) -> &SectionTemplate {
        &self.template.sections()[self.section_index]
    }

    pub fn current_question(&self) -> &QuestionTemplate {
        &self.current_section().questions()[self.question_index]
    }

    /// Prompt for the question currently awaiting an answer.
    pub fn prompt(&self) -> Prompt {
        question_prompt(self.current_section(), self.current_question())
    }

    /// Record `answer` for the current question and move on.
    fn answer(mut self, answer: &str) -> Advance {
        let id = self.current_question().id.clone();
        self.section_response.question_responses.push(QuestionResponse {
            id,
            response: answer.to_string(),
        });

        if self.question_index + 1 < self.current_section().len() {
            self.question_index += 1;
            return Advance::Continue(self);
        }

        let sealed = std::mem::replace(&mut self.section_response, SectionResponse::new(""));
        self.response.section_responses.push(sealed);

        if self.section_index + 1 < self.template.sections().len() {
            self.section_index += 1;
            self.question_index = 0;
            self.section_response = SectionResponse::new(self.current_section().name());
            Advance::Continue(self)
        } else {
            Advance::Done(self.response)
        }
    }
}

enum Advance {
    Continue(ActiveInterview),
    Done(ConversationResponse),
}

/// Per-conversation state.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    SectionActive(ActiveInterview),
}

impl SessionState {
    pub fn phase(&self) -> InterviewPhase {
        match self {
            Self::Idle => InterviewPhase::Idle,
            Self::SectionActive(_) => InterviewPhase::SectionActive,
        }
    }

    pub fn active(&self) -> Option<&ActiveInterview> {
        match self {
            Self::Idle => None,
            Self::SectionActive(active) => Some(active),
        }
    }
}

/// What the caller must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the prompt.
    Prompt(Prompt),
    /// Persist `response`, then send the prompt.
    Finalize {
        response: ConversationResponse,
        prompt: Prompt,
    },
}

impl Effect {
    pub fn prompt(&self) -> &Prompt {
        match self {
            Self::Prompt(prompt) | Self::Finalize { prompt, .. } => prompt,
        }
    }
}

/// Result of applying one inbound message.
#[derive(Debug, Clone)]
pub struct Transition {
    pub next: SessionState,
    pub effect: Effect,
}

/// Apply one inbound message to `state`.
pub fn step(state: &SessionState, catalog: &TemplateCatalog, message: &str) -> Transition {
    match state {
        SessionState::Idle => match catalog.lookup(message.trim()) {
            Some(template) => {
                let active = ActiveInterview::start(template);
                let prompt = active.prompt();
                Transition {
                    next: SessionState::SectionActive(active),
                    effect: Effect::Prompt(prompt),
                }
            }
            None => Transition {
                next: SessionState::Idle,
                effect: Effect::Prompt(template_selection_prompt(catalog.names())),
            },
        },
        SessionState::SectionActive(active) => match active.clone().answer(message) {
            Advance::Continue(active) => {
                let prompt = active.prompt();
                Transition {
                    next: SessionState::SectionActive(active),
                    effect: Effect::Prompt(prompt),
                }
            }
            Advance::Done(response) => {
                let prompt = completion_prompt(&response.template_name);
                Transition {
                    next: SessionState::Idle,
                    effect: Effect::Finalize { response, prompt },
                }
            }
        },
    }
}
