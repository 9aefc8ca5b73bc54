use std::path::Path;

use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::Client;

/// This is the typed Telegram API. Requires an instance of `Client` initialized
/// with a valid API token. Each upstream method lives next to its request type
/// in the sibling modules.
pub struct API {
    /// The underlying HTTP client.
    pub client: Client,
}

impl API {
    /// Returns a new Telegram API client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Calls `method` and returns its `result` deserialized as `Resp`. Pass
    /// `serde_json::Value` to get the payload exactly as the server sent it.
    pub async fn call<Req, Resp>(&self, method: &str, req: &Req) -> Result<Resp>
    where
        Req: Request,
        Resp: DeserializeOwned,
    {
        self.client.get(method, req).await?.into_result()
    }

    /// Download the file at `file_path` (from [`API::get_file`]) into a new
    /// file at `destination`. Returns the number of bytes written.
    pub async fn download_file(&self, file_path: &str, destination: &Path) -> Result<u64> {
        self.client.download_to(file_path, destination).await
    }
}

/// Request is a trait that all Telegram API requests must implement. Derive it
/// with `#[derive(BotRequest)]`.
pub trait Request: Serialize + Send + Sync {}

/// APIError wraps error messages returned by the Telegram API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Telegram error: {0}")]
    AppError(String),

    #[error("Client error: {0}")]
    ClientError(String),

    #[error("No result")]
    NoResult,
}

/// This is a wrapper around the Telegram API response. If `ok` is `false`,
/// the request failed, `description` usually says why, and `result` must not
/// be trusted.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    /// `true` if the request was successful.
    pub ok: bool,

    /// Error description, if `ok` is `false`.
    pub description: Option<String>,

    /// The result of the request, if `ok` is `true`.
    pub result: Option<T>,
}

#[allow(clippy::should_implement_trait)]
impl<'de, T: Deserialize<'de>> ApiResponse<T> {
    pub fn from_str(data: &'de str) -> Result<Self> {
        let response: ApiResponse<T> = serde_json::from_str(data)?;
        Ok(response)
    }
}

impl<T> ApiResponse<T> {
    /// Wraps the result in an `Ok` ApiResponse.
    #[allow(non_snake_case)]
    pub fn Ok(result: T) -> Self {
        Self {
            ok: true,
            description: None,
            result: Some(result),
        }
    }

    /// Creates an error response with the given description.
    #[allow(non_snake_case)]
    pub fn Err(description: impl Into<String>) -> Self {
        Self {
            ok: false,
            description: Some(description.into()),
            result: None,
        }
    }

    /// Returns `true` if the request was successful.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Succeeds if `ok` is `true`, whether or not a result is present.
    pub fn check(&self) -> Result<()> {
        if !self.ok {
            return Err(ApiError::AppError(
                self.description
                    .clone()
                    .unwrap_or("No error description".to_string()),
            )
            .into());
        }
        Ok(())
    }

    /// Returns the result of the request, if `ok` is `true`. Otherwise, returns
    /// an error.
    pub fn result(&self) -> Result<&T> {
        self.check()?;
        self.result.as_ref().ok_or_else(|| ApiError::NoResult.into())
    }

    /// Like [`ApiResponse::result`], but takes ownership of the payload.
    pub fn into_result(self) -> Result<T> {
        self.check()?;
        self.result.ok_or_else(|| ApiError::NoResult.into())
    }
}
