use serde::{de::IgnoredAny, Deserialize, Serialize};
use tgrelay_derive::BotRequest;

use crate::API;

use super::{chat::Chat, document::Document, user::User};

/// The parts of a Telegram message this crate reads. Every field is
/// defaulted, so partial payloads still parse.
#[derive(Default, Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Message {
    /// Unique message identifier inside this chat
    pub message_id: i64,

    /// Sender, empty for messages sent to channels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,

    /// Date the message was sent in Unix time
    pub date: i64,

    /// Conversation the message belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<Chat>,

    /// Message text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Message is a general file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
}

impl Message {
    /// Returns a message carrying the document `file_id`.
    pub fn with_document(file_id: impl Into<String>) -> Self {
        Self {
            document: Some(Document::new(file_id)),
            ..Default::default()
        }
    }
}

#[derive(Default, Debug, Serialize, Deserialize, Clone, BotRequest)]
pub struct SendMessageRequest {
    /// Unique identifier for the target chat or username of the target
    /// channel (in the format `@channelusername`)
    pub chat_id: String,

    /// Text of the message to be sent
    pub text: String,
}

impl SendMessageRequest {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, BotRequest)]
pub struct ForwardMessageRequest {
    /// Chat to forward the message to
    pub chat_id: String,

    /// Chat where the original message was sent
    pub from_chat_id: String,

    /// Message identifier in the chat specified in `from_chat_id`
    pub message_id: i64,
}

impl ForwardMessageRequest {
    pub fn new(
        from_chat_id: impl Into<String>,
        to_chat_id: impl Into<String>,
        message_id: i64,
    ) -> Self {
        Self {
            chat_id: to_chat_id.into(),
            from_chat_id: from_chat_id.into(),
            message_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, BotRequest)]
pub struct DeleteMessageRequest {
    /// Chat the message lives in
    pub chat_id: String,

    /// Identifier of the message to delete
    pub message_id: i64,
}

impl DeleteMessageRequest {
    pub fn new(chat_id: impl Into<String>, message_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id,
        }
    }
}

// These three only look at `ok`; the payload is never read.
impl API {
    pub async fn send_message(&self, req: &SendMessageRequest) -> anyhow::Result<()> {
        self.client
            .get::<_, IgnoredAny>("sendMessage", req)
            .await?
            .check()
    }

    pub async fn forward_message(&self, req: &ForwardMessageRequest) -> anyhow::Result<()> {
        self.client
            .get::<_, IgnoredAny>("forwardMessage", req)
            .await?
            .check()
    }

    pub async fn delete_message(&self, req: &DeleteMessageRequest) -> anyhow::Result<()> {
        self.client
            .get::<_, IgnoredAny>("deleteMessage", req)
            .await?
            .check()
    }
}
