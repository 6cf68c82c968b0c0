//! Where finalized interview responses go.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::interview::model::ConversationResponse;

/// Backend-agnostic storage for finalized responses, keyed by template name.
///
/// Saving under a name that already has a response replaces it.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Write `response` as one whole document under its template name.
    async fn save_response(&self, response: &ConversationResponse) -> Result<(), StoreError>;

    /// Fetch the stored response for `template_name`, if any.
    async fn get_response(
        &self,
        template_name: &str,
    ) -> Result<Option<ConversationResponse>, StoreError>;

    /// Template names that currently have a stored response, sorted.
    async fn list_template_names(&self) -> Result<Vec<String>, StoreError>;
}
