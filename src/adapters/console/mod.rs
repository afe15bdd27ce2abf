//! Console transport.
//!
//! Drives one chat from a line-oriented stream (stdin in the binary). Each
//! line becomes one turn:
//!
//! - `#N` presses the N-th button of the previous reply
//! - `!data` sends raw callback data
//! - `/quit` ends the session; anything else is sent as text

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::application::TurnHandler;
use crate::config::ConsoleConfig;
use crate::domain::conversation::{Button, Inbound, InboundEvent, Reply};
use crate::domain::foundation::{ChatId, UserId};
use crate::domain::planning::ExportedDocument;

/// What one input line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Event(InboundEvent),
    Quit,
    /// `#N` outside the keyboard range
    UnknownButton(usize),
    Empty,
}

/// Interprets a line against the keyboard of the last reply.
pub fn parse_line(line: &str, keyboard: &[Button]) -> ConsoleLine {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleLine::Empty;
    }
    if matches!(line, "/quit" | "/exit") {
        return ConsoleLine::Quit;
    }
    if let Some(data) = line.strip_prefix('!') {
        return ConsoleLine::Event(InboundEvent::Button(data.trim().to_string()));
    }
    if let Some(Ok(n)) = line.strip_prefix('#').map(|n| n.trim().parse::<usize>()) {
        return match n.checked_sub(1).and_then(|i| keyboard.get(i)) {
            Some(button) => ConsoleLine::Event(InboundEvent::Button(button.callback.clone())),
            None => ConsoleLine::UnknownButton(n),
        };
    }
    ConsoleLine::Event(InboundEvent::Text(line.to_string()))
}

/// Draws a reply: text, then the keyboard with one numbered row per line.
pub fn format_reply(reply: &Reply) -> String {
    let mut out = reply.text.clone();
    let mut n = 0;
    for row in &reply.keyboard {
        let labels: Vec<String> = row
            .iter()
            .map(|button| {
                n += 1;
                format!("[{}] {}", n, button.label)
            })
            .collect();
        out.push('\n');
        out.push_str(&labels.join("  "));
    }
    out.push('\n');
    out
}

pub struct ConsoleTransport {
    handler: Arc<TurnHandler>,
    chat_id: ChatId,
    user_id: UserId,
    output_dir: PathBuf,
}

impl ConsoleTransport {
    pub fn new(handler: Arc<TurnHandler>, config: &ConsoleConfig) -> Self {
        Self {
            handler,
            chat_id: ChatId::new(config.chat_id),
            user_id: UserId::new(config.user_id),
            output_dir: config.output_dir.clone(),
        }
    }

    /// Runs turns until `/quit` or end of input.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut keyboard: Vec<Button> = Vec::new();

        output
            .write_all(b"Type /start to plan a menu, #N to press a button, /quit to leave.\n")
            .await?;
        output.flush().await?;

        while let Some(line) = lines.next_line().await? {
            let event = match parse_line(&line, &keyboard) {
                ConsoleLine::Event(event) => event,
                ConsoleLine::Quit => break,
                ConsoleLine::Empty => continue,
                ConsoleLine::UnknownButton(n) => {
                    output
                        .write_all(format!("There is no button #{}.\n", n).as_bytes())
                        .await?;
                    output.flush().await?;
                    continue;
                }
            };

            let inbound = Inbound {
                chat_id: self.chat_id,
                user_id: self.user_id,
                event,
            };
            let reply = match self.handler.handle(inbound).await {
                Ok(reply) => reply,
                Err(err) => {
                    tracing::error!(chat_id = %self.chat_id, error = %err, "Turn failed");
                    err.user_reply()
                }
            };

            let mut text = format_reply(&reply);
            if let Some(document) = &reply.document {
                match self.save(document).await {
                    Ok(path) => text.push_str(&format!("Saved {}\n", path.display())),
                    Err(err) => {
                        tracing::error!(file = %document.file_name, error = %err, "Failed to write export");
                        text.push_str("The document could not be saved.\n");
                    }
                }
            }
            keyboard = reply.buttons().cloned().collect();

            output.write_all(text.as_bytes()).await?;
            output.flush().await?;
        }
        Ok(())
    }

    async fn save(&self, document: &ExportedDocument) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(Path::new(&document.file_name).file_name().unwrap_or_default());
        tokio::fs::write(&path, &document.bytes).await?;
        tracing::info!(path = %path.display(), bytes = document.len(), "Export written");
        Ok(path)
    }
}
