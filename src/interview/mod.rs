//! Template-driven, turn-based questionnaires.
//!
//! A user picks a template by name, answers its questions section by
//! section, and the collected answers are written to a `ResponseStore` as
//! one document when the last question is answered.

pub mod catalog;
pub mod engine;
pub mod export;
pub mod model;
pub mod prompts;
pub mod routes;
pub mod sessions;
pub mod state;

pub use catalog::{CatalogHandle, CatalogLoad, TemplateCatalog};
pub use engine::NavigationEngine;
pub use model::{
    ConversationResponse, ConversationTemplate, QuestionResponse, QuestionTemplate,
    ResponseType, SectionResponse, SectionTemplate, TemplateDefinition,
};
pub use prompts::Prompt;
pub use routes::{InterviewRouteState, interview_routes};
pub use sessions::{SessionManager, SessionSnapshot};
pub use state::{InterviewPhase, SessionState};
