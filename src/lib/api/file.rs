use anyhow::Context;
use serde::{Deserialize, Serialize};
use tgrelay_derive::BotRequest;

use super::API;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct File {
    /// Identifier for this file, which can be used to download or reuse the file
    pub file_id: String,

    /// File size
    pub file_size: Option<i64>,

    /// File path, relative to the file endpoint. Guaranteed to stay valid for
    /// at least an hour after `getFile`.
    pub file_path: Option<String>,
}

impl File {
    /// Returns the download path, or an error if Telegram didn't provide one.
    pub fn path(&self) -> anyhow::Result<&str> {
        self.file_path
            .as_deref()
            .with_context(|| format!("No file_path for file {}", self.file_id))
    }
}

#[derive(Debug, Serialize, Clone, BotRequest)]
pub struct GetFileRequest {
    /// Unique identifier for target file
    pub file_id: String,
}

impl GetFileRequest {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
        }
    }
}

impl API {
    pub async fn get_file(&self, req: &GetFileRequest) -> anyhow::Result<File> {
        self.call("getFile", req)
            .await
            .context("Failed to get file information")
    }
}
