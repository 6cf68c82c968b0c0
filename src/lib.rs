//! Interview Bot: template-driven, turn-based questionnaires over chat.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod interview;
pub mod store;
