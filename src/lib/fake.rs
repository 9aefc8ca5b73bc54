//! This is a fake Telegram API server. Plug it into a [`crate::Client`] with
//! `with_get_handler` and every request is answered locally: method calls get
//! canned envelopes, `getFile` and downloads are served from registered fake
//! files, and every call is recorded for later inspection.
use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::Url;
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::{
    api::{File, Update, User},
    client::ByteStream,
    ApiResponse, Get,
};

/// Fake downloads are streamed in chunks of this size.
const CHUNK_SIZE: usize = 1024;

/// One request seen by the fake server.
#[derive(Debug, Clone)]
pub struct FakeCall {
    pub method: String,
    pub url: String,
    pub query: HashMap<String, String>,
}

struct FakeFile {
    file_path: String,
    content: Bytes,
}

pub struct FakeAPI {
    pub bot_name: String,
    responses: Mutex<HashMap<String, String>>,
    files: Mutex<HashMap<String, FakeFile>>,
    calls: Mutex<Vec<FakeCall>>,
    downloads: Mutex<Vec<String>>,
}

impl Default for FakeAPI {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAPI {
    pub fn new() -> Self {
        Self {
            bot_name: "tgrelay".to_string(),
            responses: Mutex::new(HashMap::new()),
            files: Mutex::new(HashMap::new()),
            calls: Mutex::new(vec![]),
            downloads: Mutex::new(vec![]),
        }
    }

    /// Answer every future `method` call with the raw `body`.
    pub async fn respond(&self, method: impl Into<String>, body: impl Into<String>) {
        self.responses
            .lock()
            .await
            .insert(method.into(), body.into());
    }

    /// Answer every future `method` call with an `ok` envelope around `result`.
    pub async fn respond_ok<T: Serialize>(&self, method: impl Into<String>, result: T) {
        let body = json!(ApiResponse::Ok(result)).to_string();
        self.respond(method, body).await;
    }

    /// Answer every future `method` call with `ok=false`.
    pub async fn respond_err(&self, method: impl Into<String>, description: impl Into<String>) {
        let body = json!(ApiResponse::<()>::Err(description)).to_string();
        self.respond(method, body).await;
    }

    /// Serve `updates` from `getUpdates`.
    pub async fn set_updates(&self, updates: Vec<Update>) {
        self.respond_ok("getUpdates", updates).await;
    }

    /// Register a file that `getFile` resolves and the file endpoint serves.
    pub async fn add_file(&self, file_id: impl Into<String>, content: impl Into<Bytes>) {
        let file_id = file_id.into();
        let file_path = format!("documents/file_{}", self.files.lock().await.len());
        self.files.lock().await.insert(
            file_id,
            FakeFile {
                file_path,
                content: content.into(),
            },
        );
    }

    /// All recorded calls to `method`, oldest first.
    pub async fn calls_to(&self, method: &str) -> Vec<FakeCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// File paths requested from the file endpoint, oldest first.
    pub async fn downloads(&self) -> Vec<String> {
        self.downloads.lock().await.clone()
    }

    async fn get_file(&self, query: &HashMap<String, String>) -> String {
        let file_id = query.get("file_id").cloned().unwrap_or_default();
        match self.files.lock().await.get(&file_id) {
            Some(file) => json!(ApiResponse::Ok(File {
                file_id: file_id.clone(),
                file_size: Some(file.content.len() as i64),
                file_path: Some(file.file_path.clone()),
            }))
            .to_string(),
            None => json!(ApiResponse::<()>::Err("Bad Request: invalid file_id")).to_string(),
        }
    }

    fn default_response(&self, method: &str) -> Option<String> {
        let response = match method {
            "getMe" => json!(ApiResponse::Ok(User {
                id: 1,
                is_bot: true,
                first_name: self.bot_name.clone(),
                username: Some(self.bot_name.clone()),
                ..Default::default()
            })),
            "getUpdates" => json!(ApiResponse::Ok(Vec::<Update>::new())),
            "sendMessage" | "forwardMessage" => json!(ApiResponse::Ok(json!({
                "message_id": rand::random::<u32>(),
                "date": chrono::Utc::now().timestamp(),
            }))),
            "deleteMessage" => json!(ApiResponse::Ok(true)),
            "getUserProfilePhotos" => json!(ApiResponse::Ok(json!({
                "total_count": 0,
                "photos": [],
            }))),
            _ => return None,
        };
        Some(response.to_string())
    }
}

#[derive(Clone)]
pub struct FakeServer {
    pub api: Arc<FakeAPI>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self {
            api: Arc::new(FakeAPI::new()),
        }
    }
}

impl Default for FakeServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Get for FakeServer {
    async fn get(&self, method: String, url: String) -> Result<String> {
        debug!("method = {}, url = {}", method, url);
        let query: HashMap<String, String> = Url::parse(&url)?
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        self.api.calls.lock().await.push(FakeCall {
            method: method.clone(),
            url,
            query: query.clone(),
        });

        if let Some(body) = self.api.responses.lock().await.get(&method) {
            return Ok(body.clone());
        }
        if method == "getFile" {
            return Ok(self.api.get_file(&query).await);
        }

        Ok(self.api.default_response(&method).unwrap_or_else(|| {
            warn!("Unknown method: {}", method);
            json!(ApiResponse::<()>::Err(format!("Unknown method: {}", method))).to_string()
        }))
    }

    async fn download(&self, file_path: String) -> Result<ByteStream> {
        self.api.downloads.lock().await.push(file_path.clone());

        let content = self
            .api
            .files
            .lock()
            .await
            .values()
            .find(|f| f.file_path == file_path)
            .map(|f| f.content.clone())
            .ok_or_else(|| anyhow!("404 Not Found: {}", file_path))?;

        let chunks: Vec<Result<Bytes>> = content
            .chunks(CHUNK_SIZE)
            .map(|c| Ok(content.slice_ref(c)))
            .collect();
        Ok(futures::stream::iter(chunks).boxed())
    }
}
