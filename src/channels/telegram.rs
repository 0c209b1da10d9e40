//! Telegram channel: long-polls the Bot API for messages and button presses.
//!
//! Replies are plain-text `sendMessage` calls; the last message of each reply
//! carries the inline keyboard.

use async_trait::async_trait;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};
use crate::error::ChannelError;
use crate::flow::{Button, UserInput};

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Telegram channel: connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: String,
    allowed_users: Vec<String>,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        api_url(&self.bot_token, method)
    }

    /// Send a text message, split to fit Telegram's limit. The keyboard, if
    /// any, goes on the final chunk.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: Option<&serde_json::Value>,
    ) -> Result<(), ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            let mut body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            if i == last {
                if let Some(markup) = reply_markup {
                    body["reply_markup"] = markup.clone();
                }
            }
            self.post_send_message(&body).await?;
        }
        Ok(())
    }

    async fn post_send_message(&self, body: &serde_json::Value) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!("sendMessage returned {status}: {err}"),
            });
        }
        Ok(())
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let bot_token = self.bot_token.clone();
        let allowed_users = self.allowed_users.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for messages...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": 30,
                    "allowed_updates": ["message", "callback_query"]
                });

                let resp = match client
                    .post(api_url(&bot_token, "getUpdates"))
                    .json(&body)
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let Some(results) = data.get("result").and_then(serde_json::Value::as_array)
                else {
                    tracing::warn!("Telegram getUpdates returned no result: {data}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                };

                for update in results {
                    if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64)
                    {
                        offset = uid + 1;
                    }

                    let Some(event) = parse_update(update) else {
                        continue;
                    };

                    // Stop the button's loading spinner whether or not we act on it.
                    if let Some(ref callback_id) = event.callback_id {
                        let _ = client
                            .post(api_url(&bot_token, "answerCallbackQuery"))
                            .json(&serde_json::json!({ "callback_query_id": callback_id }))
                            .send()
                            .await;
                    }

                    if !check_user_allowed(&allowed_users, event.identities()) {
                        tracing::warn!(
                            "Telegram: ignoring event from unauthorized user: \
                             username={}, user_id={}",
                            event.username,
                            event.user_id.as_deref().unwrap_or("unknown")
                        );
                        continue;
                    }

                    if tx.send(event.into_incoming()).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let chat_id = msg
            .metadata
            .get("chat_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: "No chat_id in message metadata".into(),
            })?;

        let render = response.render;
        let keyboard = inline_keyboard(&render.buttons);
        for (text, markup) in outgoing_messages(&render.messages, keyboard.as_ref()) {
            self.send_message(chat_id, text, markup).await?;
        }
        Ok(())
    }

    async fn send_status(
        &self,
        status: StatusUpdate,
        metadata: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        let StatusUpdate::Thinking(_) = status;
        if let Some(chat_id) = metadata.get("chat_id").and_then(|v| v.as_str()) {
            let _ = self
                .client
                .post(self.api_url("sendChatAction"))
                .json(&serde_json::json!({
                    "chat_id": chat_id,
                    "action": "typing"
                }))
                .send()
                .await;
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::HealthCheckFailed {
                name: "telegram".into(),
            })
        }
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

// ── Update parsing ──────────────────────────────────────────────────

/// A message or button press extracted from a `getUpdates` result.
#[derive(Debug, Clone, PartialEq)]
struct TelegramEvent {
    user_id: Option<String>,
    username: String,
    first_name: Option<String>,
    chat_id: String,
    input: UserInput,
    /// Set for button presses; must be acknowledged.
    callback_id: Option<String>,
}

impl TelegramEvent {
    fn identities(&self) -> Vec<&str> {
        let mut ids = vec![self.username.as_str()];
        if let Some(ref id) = self.user_id {
            ids.push(id.as_str());
        }
        ids
    }

    fn into_incoming(self) -> IncomingMessage {
        let user = self.user_id.as_deref().unwrap_or(&self.username).to_string();
        let display = self
            .first_name
            .clone()
            .unwrap_or_else(|| self.username.clone());
        IncomingMessage::new("telegram", &user, self.input)
            .with_metadata(serde_json::json!({
                "chat_id": self.chat_id,
                "username": self.username,
            }))
            .with_user_name(&display)
    }
}

/// Extract a text message or callback query from one update.
fn parse_update(update: &serde_json::Value) -> Option<TelegramEvent> {
    let (from, chat, input, callback_id) = if let Some(query) = update.get("callback_query") {
        let data = query.get("data").and_then(serde_json::Value::as_str)?;
        let chat = query.get("message").and_then(|m| m.get("chat"));
        let id = query
            .get("id")
            .and_then(serde_json::Value::as_str)
            .map(String::from);
        (
            query.get("from"),
            chat,
            UserInput::Button(data.to_string()),
            id,
        )
    } else {
        let message = update.get("message")?;
        let text = message.get("text").and_then(serde_json::Value::as_str)?;
        (
            message.get("from"),
            message.get("chat"),
            UserInput::from_text(text),
            None,
        )
    };

    let chat_id = chat
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)
        .map(|id| id.to_string())?;

    Some(TelegramEvent {
        user_id: from
            .and_then(|f| f.get("id"))
            .and_then(serde_json::Value::as_i64)
            .map(|id| id.to_string()),
        username: from
            .and_then(|f| f.get("username"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        first_name: from
            .and_then(|f| f.get("first_name"))
            .and_then(serde_json::Value::as_str)
            .map(String::from),
        chat_id,
        input,
        callback_id,
    })
}

// ── Helpers ─────────────────────────────────────────────────────────

fn api_url(bot_token: &str, method: &str) -> String {
    format!("https://api.telegram.org/bot{bot_token}/{method}")
}

/// Check if any identity in the iterator matches the allowed users list.
fn check_user_allowed<'a>(
    allowed_users: &[String],
    identities: impl IntoIterator<Item = &'a str>,
) -> bool {
    let ids: Vec<&str> = identities.into_iter().collect();
    allowed_users
        .iter()
        .any(|u| u == "*" || ids.contains(&u.as_str()))
}

/// One button per row, as the Bot API `reply_markup` object.
fn inline_keyboard(buttons: &[Button]) -> Option<serde_json::Value> {
    if buttons.is_empty() {
        return None;
    }
    let rows: Vec<serde_json::Value> = buttons
        .iter()
        .map(|b| serde_json::json!([{ "text": b.label, "callback_data": b.data }]))
        .collect();
    Some(serde_json::json!({ "inline_keyboard": rows }))
}

/// Pair each non-blank message with its markup. Blank messages are not sent,
/// so the keyboard goes on the last message that is.
fn outgoing_messages<'a>(
    messages: &'a [String],
    keyboard: Option<&'a serde_json::Value>,
) -> Vec<(&'a str, Option<&'a serde_json::Value>)> {
    let mut out: Vec<_> = messages
        .iter()
        .map(String::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(|text| (text, None))
        .collect();
    if let Some(last) = out.last_mut() {
        last.1 = keyboard;
    }
    out
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut cut = max_len;
        while !remaining.is_char_boundary(cut) {
            cut -= 1;
        }
        let chunk = &remaining[..cut];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(cut);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { cut } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────
