use anyhow::Context;
use serde::{Deserialize, Serialize};
use tgrelay_derive::BotRequest;

use crate::API;

use super::{message::Message, Document};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Update {
    /// The update‘s unique identifier. Identifiers increase sequentially.
    #[serde(default)]
    pub update_id: i64,

    /// New incoming message of any kind — text, photo, sticker, etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

impl Update {
    /// Returns the document attached to this update's message, if any.
    pub fn document(&self) -> Option<&Document> {
        self.message.as_ref()?.document.as_ref()
    }
}

/// Use this method to receive incoming updates using long or short
/// polling. An Array of Update objects is returned.
#[derive(Debug, Clone, Deserialize, Serialize, Default, BotRequest)]
pub struct GetUpdatesRequest {
    /// Identifier of the first update to be returned. By default, updates
    /// starting with the earliest unconfirmed update are returned. An update is
    /// confirmed as soon as getUpdates is called with a higher offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,

    /// Limits the number of updates to be retrieved. Defaults to 100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,

    /// Timeout in seconds for long polling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
}

/// Convenience methods for `GetUpdatesRequest`.
impl GetUpdatesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_timeout(mut self, timeout: i64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl API {
    /// Use this method to receive incoming updates using short polling. See
    /// [the official docs](https://core.telegram.org/bots/api#getupdates).
    pub async fn get_updates(&self, req: &GetUpdatesRequest) -> anyhow::Result<Vec<Update>> {
        self.call("getUpdates", req)
            .await
            .context("Failed to retrieve updates")
    }
}
