//! Applies transitions and carries out finalization.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::catalog::CatalogHandle;
use super::prompts::Prompt;
use super::state::{step, Effect, SessionState, Transition};
use crate::error::TurnError;
use crate::store::ResponseStore;

/// Drives one session forward per inbound message.
///
/// The catalog is injected; each turn reads a snapshot of it. A finalized
/// response is written to the store before the session is reset, so a
/// failed write leaves the session where it was.
pub struct NavigationEngine {
    catalog: CatalogHandle,
    store: Arc<dyn ResponseStore>,
}

impl NavigationEngine {
    pub fn new(catalog: CatalogHandle, store: Arc<dyn ResponseStore>) -> Self {
        Self { catalog, store }
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<dyn ResponseStore> {
        &self.store
    }

    /// Process `message` against `state` and return the prompt to send.
    pub async fn handle(&self, state: &mut SessionState, message: &str) -> Result<Prompt, TurnError> {
        let catalog = self.catalog.current().await;
        let before = state.phase();
        let Transition { next, effect } = step(state, &catalog, message);

        let prompt = match effect {
            Effect::Prompt(prompt) => prompt,
            Effect::Finalize { response, prompt } => {
                if let Err(e) = self.store.save_response(&response).await {
                    warn!(
                        template = %response.template_name,
                        store = self.store.name(),
                        error = %e,
                        "Failed to persist response; session left unchanged"
                    );
                    return Err(e.into());
                }
                info!(
                    template = %response.template_name,
                    sections = response.section_responses.len(),
                    answers = response.answer_count(),
                    "Interview finalized"
                );
                prompt
            }
        };

        debug!(from = %before, to = %next.phase(), "Session transition");
        *state = next;
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::catalog::TemplateCatalog;
    use crate::interview::model::{
        ConversationResponse, ConversationTemplate, QuestionResponse, QuestionTemplate,
        SectionResponse, SectionTemplate,
    };
    use crate::interview::prompts::{COMPLETION_TITLE, SELECT_TEMPLATE_TITLE};
    use crate::interview::state::InterviewPhase;
    use crate::store::MemoryStore;

    fn exit_survey() -> ConversationTemplate {
        let basics = SectionTemplate::new(
            "Exit Survey",
            "Basics",
            vec![
                QuestionTemplate::new("q1", "Role?"),
                QuestionTemplate::new("q2", "Tenure?"),
            ],
        )
        .unwrap();
        ConversationTemplate::new("Exit Survey", vec![basics]).unwrap()
    }

    fn engine(store: Arc<MemoryStore>) -> NavigationEngine {
        let catalog = TemplateCatalog::from_templates([exit_survey()]).catalog;
        NavigationEngine::new(CatalogHandle::new(catalog), store)
    }

    #[tokio::test]
    async fn exit_survey_scenario() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(Arc::clone(&store));
        let mut state = SessionState::default();

        let p = engine.handle(&mut state, "Exit Survey").await.unwrap();
        assert_eq!(p.title, "Role?");
        assert_eq!(p.subtitle.as_deref(), Some("Basics"));

        let p = engine.handle(&mut state, "Engineer").await.unwrap();
        assert_eq!(p.title, "Tenure?");
        assert_eq!(p.subtitle.as_deref(), Some("Basics"));

        let p = engine.handle(&mut state, "3 years").await.unwrap();
        assert_eq!(p.title, COMPLETION_TITLE);
        assert_eq!(state.phase(), InterviewPhase::Idle);

        let stored = store.get_response("Exit Survey").await.unwrap().unwrap();
        assert_eq!(
            stored,
            ConversationResponse {
                template_name: "Exit Survey".to_string(),
                section_responses: vec![SectionResponse {
                    section_name: "Basics".to_string(),
                    question_responses: vec![
                        QuestionResponse {
                            id: "q1".to_string(),
                            response: "Engineer".to_string()
                        },
                        QuestionResponse {
                            id: "q2".to_string(),
                            response: "3 years".to_string()
                        },
                    ],
                }],
            }
        );
    }

    #[tokio::test]
    async fn unknown_template_reprompts_and_stays_idle() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(Arc::clone(&store));
        let mut state = SessionState::default();

        let p = engine.handle(&mut state, "Unknown Template").await.unwrap();
        assert_eq!(p.title, SELECT_TEMPLATE_TITLE);
        assert_eq!(p.options, vec!["Exit Survey"]);
        assert_eq!(state.phase(), InterviewPhase::Idle);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn persistence_failure_keeps_session_for_retry() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(Arc::clone(&store));
        let mut state = SessionState::default();
        engine.handle(&mut state, "Exit Survey").await.unwrap();
        engine.handle(&mut state, "Engineer").await.unwrap();

        store.set_fail_writes(true);
        let err = engine.handle(&mut state, "3 years").await.unwrap_err();
        assert!(matches!(err, TurnError::Persistence(_)));

        // Still waiting on the last question with the earlier answer intact.
        let active = state.active().unwrap();
        assert_eq!(active.question_index(), 1);
        assert_eq!(active.section_response().question_responses.len(), 1);

        store.set_fail_writes(false);
        let p = engine.handle(&mut state, "3 years").await.unwrap();
        assert_eq!(p.title, COMPLETION_TITLE);
        assert_eq!(state.phase(), InterviewPhase::Idle);
        assert_eq!(store.save_count(), 1);
    }

    /// Completing the same template twice keeps only the latest submission.
    #[tokio::test]
    async fn finalize_overwrites_previous_submission() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(Arc::clone(&store));

        for role in ["Engineer", "Designer"] {
            let mut state = SessionState::default();
            engine.handle(&mut state, "Exit Survey").await.unwrap();
            engine.handle(&mut state, role).await.unwrap();
            engine.handle(&mut state, "1 year").await.unwrap();
        }

        let stored = store.get_response("Exit Survey").await.unwrap().unwrap();
        assert_eq!(stored.section_responses[0].question_responses[0].response, "Designer");
        assert_eq!(store.list_template_names().await.unwrap(), vec!["Exit Survey"]);
        assert_eq!(store.save_count(), 2);
    }

    #[tokio::test]
    async fn catalog_reload_does_not_disturb_active_session() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(Arc::clone(&store));
        let mut state = SessionState::default();
        engine.handle(&mut state, "Exit Survey").await.unwrap();

        engine.catalog().replace(TemplateCatalog::new()).await;

        engine.handle(&mut state, "Engineer").await.unwrap();
        let p = engine.handle(&mut state, "2 years").await.unwrap();
        assert_eq!(p.title, COMPLETION_TITLE);
        assert!(store.get_response("Exit Survey").await.unwrap().is_some());

        let p = engine.handle(&mut state, "Exit Survey").await.unwrap();
        assert_eq!(p.title, SELECT_TEMPLATE_TITLE);
        assert!(p.options.is_empty());
    }
}
