//! In-memory response store for tests and throwaway runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::ResponseStore;
use crate::error::StoreError;
use crate::interview::model::ConversationResponse;

/// Keeps responses in a map. Can be told to fail writes, to exercise the
/// persistence-failure path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    responses: RwLock<BTreeMap<String, ConversationResponse>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `save_response` calls fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save_response(&self, response: &ConversationResponse) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("simulated write failure")));
        }
        self.responses
            .write()
            .await
            .insert(response.template_name.clone(), response.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_response(
        &self,
        template_name: &str,
    ) -> Result<Option<ConversationResponse>, StoreError> {
        Ok(self.responses.read().await.get(template_name).cloned())
    }

    async fn list_template_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.responses.read().await.keys().cloned().collect())
    }
}
