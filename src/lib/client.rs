use std::{
    fmt::{self, Formatter},
    path::Path,
    time::Duration,
};

use anyhow::{Context, Result};
use bytes::Bytes;
use derive_more::*;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use crate::api::{ApiError, ApiResponse, Request};

/// A stream of file chunks, as returned by [`Client::download`].
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// This is a wrapper around the Telegram API token string. Get your token from
/// [@BotFather](https://t.me/BotFather).
#[derive(Clone, From, Into, FromStr, Display)]
pub struct ApiToken(String);

/// Tokens are secrets, keep them out of `{:?}` output.
impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(..)")
    }
}

/// GetFn lets you override the default GET request handler. It receives the
/// method name and the full request URL, and returns the response body. This
/// is useful for testing.
pub struct GetFn(pub Box<dyn Fn(String, String) -> Result<String> + Send + Sync>);

impl<T> From<T> for GetFn
where
    T: Fn(String, String) -> Result<String> + Send + Sync + 'static,
{
    fn from(f: T) -> Self {
        Self(Box::new(f))
    }
}

impl fmt::Debug for GetFn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("GetFn")
    }
}

/// Replaces the HTTP transport, both for API methods and for file downloads.
/// See [`crate::fake::FakeServer`].
#[async_trait::async_trait]
pub trait Get {
    /// Issue `method` against `url` and return the raw response body.
    async fn get(&self, method: String, url: String) -> Result<String>;

    /// Stream the contents of `file_path` from the file endpoint.
    async fn download(&self, file_path: String) -> Result<ByteStream>;
}

/// This is a thin shim around the Telegram HTTP client. Requires a valid API token.
pub struct Client {
    /// Base URL for all method calls, constructed from the API token.
    base_url: String,

    /// Base URL for file downloads.
    file_url: String,

    /// The underlying HTTP client.
    client: reqwest::Client,

    /// A handler that implements the Get trait. Useful for testing.
    get_handler: Option<Box<dyn Get + Send + Sync>>,

    /// A function that handles GET requests for API methods. Useful for testing.
    get_handler_fn: Option<GetFn>,

    /// Total deadline for one API method call. Downloads only get the connect
    /// timeout, since a large file on a slow link may take much longer.
    method_timeout: Option<Duration>,
}

impl Client {
    /// Returns a new Telegram API client with the default `reqwest` settings.
    pub fn new(token: impl Into<ApiToken>) -> Self {
        let token = token.into();
        Self {
            base_url: format!("https://api.telegram.org/bot{token}"),
            file_url: format!("https://api.telegram.org/file/bot{token}"),
            client: reqwest::Client::new(),
            get_handler: None,
            get_handler_fn: None,
            method_timeout: None,
        }
    }

    /// Rebuilds the underlying HTTP client with `timeout` as its connect
    /// timeout, and applies `timeout` to each API method call as a whole.
    /// File downloads have no total deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        self.method_timeout = Some(timeout);
        Ok(self)
    }

    /// Sets a function that handles GET requests. This is useful for testing.
    pub fn with_get_handler_fn(mut self, get_fn: impl Into<GetFn>) -> Self {
        self.get_handler_fn = Some(get_fn.into());
        self
    }

    pub fn with_get_handler(mut self, get_handler: impl Get + Send + Sync + 'static) -> Self {
        self.get_handler = Some(Box::new(get_handler));
        self
    }

    /// Returns the URL for `method`, with `req` encoded as query parameters.
    pub fn method_url<Req: Request>(&self, method: &str, req: &Req) -> Result<Url> {
        let endpoint = format!("{}/{}", self.base_url, method);
        let pairs = query_pairs(req)?;
        let url = if pairs.is_empty() {
            Url::parse(&endpoint)?
        } else {
            Url::parse_with_params(&endpoint, pairs)?
        };
        Ok(url)
    }

    /// Returns the direct download URL for a `file_path` obtained from `getFile`.
    pub fn file_url(&self, file_path: &str) -> String {
        format!("{}/{}", self.file_url, file_path)
    }

    /// The HTTP request sent for an API method call to `url`.
    pub fn method_request(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match self.method_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    /// The HTTP request sent to download `file_path`.
    pub fn file_request(&self, file_path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.file_url(file_path))
    }

    /// Send `method` to the Telegram API as a GET request, with `req` as its
    /// query string, and parse the response envelope. An `ok=false` envelope is
    /// returned as-is; only transport and parse failures are errors here.
    pub async fn get<Req, Resp>(&self, method: &str, req: &Req) -> Result<ApiResponse<Resp>>
    where
        Req: Request,
        Resp: DeserializeOwned,
    {
        let url = self.method_url(method, req)?;
        debug!("GET /{}", method);

        let body = if let Some(ref get_handler) = self.get_handler_fn {
            (get_handler.0)(method.to_string(), url.to_string())?
        } else if let Some(ref get_handler) = self.get_handler {
            get_handler.get(method.to_string(), url.to_string()).await?
        } else {
            self.method_request(url).send().await?.text().await?
        };

        debug!("Response /{}:\n{}", method, body);
        ApiResponse::<Resp>::from_str(&body)
            .with_context(|| format!("Unparseable response to /{method}"))
    }

    /// Stream the file at `file_path` from the file endpoint.
    pub async fn download(&self, file_path: &str) -> Result<ByteStream> {
        debug!("Downloading file /{}", file_path);
        if let Some(ref get_handler) = self.get_handler {
            return get_handler.download(file_path.to_string()).await;
        }

        let response = self
            .file_request(file_path)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes_stream().map_err(anyhow::Error::from).boxed())
    }

    /// Stream the file at `file_path` into a newly created file at
    /// `destination`, returning the number of bytes written. Fails if
    /// `destination` already exists. A partially written file is removed.
    pub async fn download_to(&self, file_path: &str, destination: &Path) -> Result<u64> {
        let mut stream = self.download(file_path).await?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
            .await
            .with_context(|| format!("Failed to create {}", destination.display()))?;

        let copied: Result<u64> = async {
            let mut written = 0u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(written)
        }
        .await;

        if copied.is_err() {
            drop(file);
            if let Err(err) = tokio::fs::remove_file(destination).await {
                warn!(
                    "Couldn't remove partial download {}: {}",
                    destination.display(),
                    err
                );
            }
        } else {
            debug!("File downloaded successfully /{}", file_path);
        }
        copied
    }
}

/// Flattens a request into query parameters. Strings are passed verbatim,
/// other scalars in their JSON form, and `null` fields are skipped.
fn query_pairs<Req: Request>(req: &Req) -> Result<Vec<(String, String)>> {
    match serde_json::to_value(req)? {
        Value::Null => Ok(vec![]),
        Value::Object(fields) => Ok(fields
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect()),
        other => Err(ApiError::ClientError(format!(
            "request must serialize to an object, got {other}"
        ))
        .into()),
    }
}
