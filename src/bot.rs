//! The run loop between channels and sessions.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::channels::{ChannelManager, IncomingMessage, OutgoingResponse};
use crate::error::{Error, TurnError};
use crate::interview::SessionManager;

/// Pulls messages off every channel and answers each with the next prompt.
pub struct InterviewBot {
    channels: Arc<ChannelManager>,
    sessions: Arc<SessionManager>,
}

impl InterviewBot {
    pub fn new(channels: ChannelManager, sessions: Arc<SessionManager>) -> Self {
        Self {
            channels: Arc::new(channels),
            sessions,
        }
    }

    /// Run until Ctrl+C or until every channel stream ends.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;

        info!(channels = ?self.channels.names(), "Interview bot ready and listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            let response = self.handle_message(&message).await;
            if let Err(e) = self.channels.respond(&message, response).await {
                warn!(channel = %message.channel, error = %e, "Failed to deliver response");
            }
        }

        info!("Interview bot shutting down...");
        self.channels.shutdown_all().await?;
        Ok(())
    }

    async fn handle_message(&self, message: &IncomingMessage) -> OutgoingResponse {
        let session_key = message.session_key();
        debug!(
            session = %session_key,
            channel = %message.channel,
            chars = message.content.len(),
            "Received message"
        );

        match self
            .sessions
            .handle_turn(Some(&session_key), &message.content)
            .await
        {
            Ok(prompt) => OutgoingResponse::prompt(prompt),
            Err(e @ TurnError::Persistence(_)) => {
                error!(session = %session_key, error = %e, "Turn failed");
                OutgoingResponse::text(format!(
                    "Error: {e}. Your answers are kept; send your last answer again to retry."
                ))
            }
            Err(e) => {
                error!(session = %session_key, error = %e, "Turn failed");
                OutgoingResponse::text(format!("Error: {e}"))
            }
        }
    }
}
