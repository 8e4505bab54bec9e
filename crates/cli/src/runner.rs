//! Interactive console chat against the chat service.
//!
//! Reads one line per turn and streams the reply back through
//! `stream_without_logger` under a fixed conversation id, so the whole
//! session shares one memory window.

use simplechat_client::{ChatService, Prompt};
use simplechat_core::message::ConversationId;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_stream::StreamExt;
use tracing::debug;

/// Conversation id used for every console turn.
pub const CLI_CONVERSATION_ID: &str = "cli";

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Chat(#[from] simplechat_core::Error),
}

pub struct CliRunner {
    service: ChatService,
    app_name: String,
}

impl CliRunner {
    pub fn new(service: ChatService, app_name: impl Into<String>) -> Self {
        Self {
            service,
            app_name: app_name.into(),
        }
    }

    /// Run until `input` reaches EOF or fails.
    ///
    /// Every line is sent as typed; there is no exit command. A failed turn
    /// is reported inline and the loop continues.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<(), RunnerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let conversation_id = ConversationId::parse(CLI_CONVERSATION_ID)?;
        let mut lines = input.lines();

        output
            .write_all(format!("\n{} CLI Chat Bot\n", self.app_name).as_bytes())
            .await?;

        loop {
            output.write_all(b"\nUser: ").await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                debug!("Console input closed");
                break;
            };

            output.write_all(b"\nAssistant: ").await?;
            output.flush().await?;
            self.turn(&conversation_id, &line, &mut output).await?;
            output.write_all(b"\n").await?;
        }

        output.flush().await?;
        Ok(())
    }

    async fn turn<W: AsyncWrite + Unpin>(
        &self,
        conversation_id: &ConversationId,
        line: &str,
        output: &mut W,
    ) -> Result<(), RunnerError> {
        let mut stream = match self
            .service
            .stream_without_logger(conversation_id, Prompt::user(line))
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                output.write_all(format!("[error] {e}").as_bytes()).await?;
                return Ok(());
            }
        };

        while let Some(delta) = stream.next().await {
            match delta {
                Ok(text) => {
                    output.write_all(text.as_bytes()).await?;
                    output.flush().await?;
                }
                Err(e) => {
                    output.write_all(format!("\n[error] {e}").as_bytes()).await?;
                    break;
                }
            }
        }
        Ok(())
    }
}
