//! Terminal channel: one interview turn per stdin line, prompts on stdout.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::ChannelError;

const INPUT_MARKER: &str = "> ";

/// Every line typed at the terminal belongs to one local session.
pub struct CliChannel {
    user_id: String,
}

impl CliChannel {
    pub fn new() -> Self {
        Self::with_user("local-user")
    }

    /// Run the terminal session as `user_id`.
    pub fn with_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn `reader` into a stream of messages, one per non-blank line.
///
/// Lines are passed on untrimmed. The stream ends at EOF or on a read error.
pub(crate) fn line_messages<R>(reader: R, user_id: String) -> MessageStream
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let lines = reader.lines();
    Box::pin(stream::unfold(
        (lines, user_id),
        |(mut lines, user_id)| async move {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => eprint!("{INPUT_MARKER}"),
                    Ok(Some(line)) => {
                        let msg = IncomingMessage::new("cli", user_id.as_str(), line);
                        return Some((msg, (lines, user_id)));
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        tracing::error!(error = %e, "Error reading terminal input");
                        return None;
                    }
                }
            }
        },
    ))
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        eprint!("{INPUT_MARKER}");
        Ok(line_messages(
            BufReader::new(tokio::io::stdin()),
            self.user_id.clone(),
        ))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        println!("\n{}\n", response.content);
        eprint!("{INPUT_MARKER}");
        Ok(())
    }
}
