//! One `SessionState` per conversation key.
//!
//! Each session sits behind its own mutex, held for the whole turn
//! (including the store write on finalization), so two messages for the same
//! key never interleave while different keys proceed independently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::engine::NavigationEngine;
use super::prompts::Prompt;
use super::state::{InterviewPhase, SessionState};
use crate::error::TurnError;

struct SessionEntry {
    state: SessionState,
    last_active: DateTime<Utc>,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            state: SessionState::default(),
            last_active: Utc::now(),
        }
    }
}

/// Read-only view of a session for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub session_key: String,
    pub phase: InterviewPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_prompt: Option<Prompt>,
    pub last_active: DateTime<Utc>,
}

/// Owns every live session and routes turns through the engine.
pub struct SessionManager {
    engine: Arc<NavigationEngine>,
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionEntry>>>>,
}

impl SessionManager {
    pub fn new(engine: Arc<NavigationEngine>) -> Self {
        Self {
            engine,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &Arc<NavigationEngine> {
        &self.engine
    }

    /// Handle one inbound message for `session_key`.
    ///
    /// A missing or blank key fails the turn; no session is created for it.
    pub async fn handle_turn(
        &self,
        session_key: Option<&str>,
        text: &str,
    ) -> Result<Prompt, TurnError> {
        let key = session_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(TurnError::SessionKeyMissing)?;

        let entry = self.get_or_create(key).await;
        let mut entry = entry.lock().await;
        entry.last_active = Utc::now();
        debug!(session = %key, phase = %entry.state.phase(), "Handling turn");
        self.engine.handle(&mut entry.state, text).await
    }

    async fn get_or_create(&self, key: &str) -> Arc<Mutex<SessionEntry>> {
        if let Some(entry) = self.sessions.read().await.get(key) {
            return Arc::clone(entry);
        }
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(key.to_string()).or_insert_with(|| {
            info!(session = %key, "New session");
            Arc::new(Mutex::new(SessionEntry::new()))
        });
        Arc::clone(entry)
    }

    /// Current view of `session_key`, if the session exists.
    pub async fn snapshot(&self, session_key: &str) -> Option<SessionSnapshot> {
        let entry = self.sessions.read().await.get(session_key).cloned()?;
        let entry = entry.lock().await;
        let active = entry.state.active();
        Some(SessionSnapshot {
            session_key: session_key.to_string(),
            phase: entry.state.phase(),
            template_name: active.map(|a| a.template().name().to_string()),
            section_index: active.map(|a| a.section_index()),
            question_index: active.map(|a| a.question_index()),
            current_prompt: active.map(|a| a.prompt()),
            last_active: entry.last_active,
        })
    }

    /// Drop a session entirely, discarding any unfinished answers.
    pub async fn end_session(&self, session_key: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_key).is_some();
        if removed {
            info!(session = %session_key, "Session ended");
        }
        removed
    }

    /// Remove sessions idle for longer than `idle`. Returns how many went.
    ///
    /// Sessions held by a turn, from lookup through the end of the turn,
    /// are skipped.
    pub async fn prune_stale_sessions(&self, idle: Duration) -> usize {
        let idle = chrono::Duration::from_std(idle).unwrap_or(chrono::Duration::MAX);
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            if Arc::strong_count(entry) > 1 {
                return true;
            }
            match entry.try_lock() {
                Ok(entry) => now.signed_duration_since(entry.last_active) <= idle,
                Err(_) => true,
            }
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Spawn a task that prunes idle sessions every `interval`.
pub fn spawn_pruning_task(
    sessions: Arc<SessionManager>,
    idle: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // Skip immediate first tick
        loop {
            ticker.tick().await;
            sessions.prune_stale_sessions(idle).await;
        }
    })
}
