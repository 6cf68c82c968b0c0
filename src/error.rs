//! Error types for the interview bot.

use std::path::PathBuf;

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Turn error: {0}")]
    Turn(#[from] TurnError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Problems found while loading or validating template definitions.
///
/// Every variant except `Io` rejects a single template; the rest of the
/// catalog still loads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Cannot read template source {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Malformed template definition in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Template definition has an empty TemplateName")]
    EmptyTemplateName,

    #[error("Template {template} has no sections")]
    NoSections { template: String },

    #[error("Template {template} has a section with an empty SectionName")]
    EmptySectionName { template: String },

    #[error("Section {section} of template {template} has no questions")]
    NoQuestions { template: String, section: String },

    #[error("Section {section} of template {template} has a question with an empty Id")]
    EmptyQuestionId { template: String, section: String },

    #[error("Section {section} of template {template} repeats question id {id}")]
    DuplicateQuestionId {
        template: String,
        section: String,
        id: String,
    },

    #[error("Template {name} is already registered")]
    DuplicateTemplate { name: String },
}

/// Response persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("No channel registered under {0}")]
    UnknownChannel(String),
}

/// Failures of a single conversational turn.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("No session key accompanied the message")]
    SessionKeyMissing,

    #[error("Failed to persist the finalized response: {0}")]
    Persistence(#[from] StoreError),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
