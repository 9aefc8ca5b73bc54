//! [`BotClient`] is the best-effort facade over the Telegram API.
//!
//! Every operation logs its own failures and never returns an error the caller
//! is forced to handle. Each one still hands back an [`Outcome`], so callers
//! (and tests) can tell success from a silent failure without scraping logs.
use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    api::{
        DeleteMessageRequest, ForwardMessageRequest, GetFileRequest, GetMeRequest,
        GetUpdatesRequest, GetUserProfilePhotosRequest, Request, SendMessageRequest, Update,
        User, UserProfilePhotos,
    },
    scheduler::{DeletionScheduler, DeletionTask},
    Client, Config, API,
};

/// The result of a best-effort operation. The failure has already been logged
/// by the time the caller sees it.
#[derive(Debug)]
pub enum Outcome<T> {
    Done(T),
    Failed(anyhow::Error),
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn is_failed(&self) -> bool {
        !self.is_done()
    }

    /// Returns the value, discarding any failure.
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Done(v) => Some(v),
            Outcome::Failed(_) => None,
        }
    }

    pub fn err(&self) -> Option<&anyhow::Error> {
        match self {
            Outcome::Done(_) => None,
            Outcome::Failed(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            Outcome::Done(v) => Ok(v),
            Outcome::Failed(err) => Err(err),
        }
    }
}

/// Logs `result`'s failure under `what` and wraps it in an [`Outcome`].
fn report<T>(result: Result<T>, what: &str) -> Outcome<T> {
    match result {
        Ok(v) => Outcome::Done(v),
        Err(err) => {
            error!("{}, {:#}", what, err);
            Outcome::Failed(err)
        }
    }
}

/// A file written by [`BotClient::download_file_from_channel`].
#[derive(Debug, Clone)]
pub struct Download {
    pub file_id: String,
    pub path: PathBuf,
    pub bytes: u64,

    /// The cleanup scheduled for `path`. `None` if the scheduler refused the
    /// task (it was stopped); the file then stays until someone removes it.
    pub deletion: Option<DeletionTask>,
}

/// Relays messages and files between the application and the Telegram API.
///
/// Construct it once with [`BotClient::start`] and share it (e.g. behind an
/// `Arc`). Operations may run concurrently; none of them mutate shared state.
/// Call [`BotClient::stop`] on shutdown.
pub struct BotClient {
    api: API,
    chat_id: String,
    download_dir: PathBuf,
    deletion_delay: Duration,
    scheduler: DeletionScheduler,
}

impl fmt::Debug for BotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotClient")
            .field("chat_id", &self.chat_id)
            .field("download_dir", &self.download_dir)
            .field("deletion_delay", &self.deletion_delay)
            .finish_non_exhaustive()
    }
}

impl BotClient {
    /// Builds the HTTP client from `config` and starts the deletion scheduler.
    /// Must be called from within a tokio runtime.
    pub fn start(config: Config) -> Result<Self> {
        let client = Client::new(config.token.clone()).with_timeout(config.timeout)?;
        Ok(Self::with_client(client, config))
    }

    /// Like [`BotClient::start`], but with a preconfigured `Client`. Use this to
    /// plug in a fake transport.
    pub fn with_client(client: Client, config: Config) -> Self {
        info!(
            "Starting bot client for chat {} (downloads in {})",
            config.chat_id,
            config.download_dir.display()
        );
        Self {
            api: API::new(client),
            chat_id: config.chat_id,
            download_dir: config.download_dir,
            deletion_delay: config.deletion_delay,
            scheduler: DeletionScheduler::start(),
        }
    }

    /// Stops the deletion scheduler and releases the HTTP client. Deletions
    /// that haven't fired yet are discarded.
    pub async fn stop(self) {
        let pending = self.scheduler.pending();
        self.scheduler.stop().await;
        info!(
            "Bot client stopped ({} scheduled deletions dropped)",
            pending
        );
    }

    pub fn api(&self) -> &API {
        &self.api
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn scheduler(&self) -> &DeletionScheduler {
        &self.scheduler
    }

    /// Where `process_updates` stores the document `file_id`.
    pub fn download_path(&self, file_id: &str) -> PathBuf {
        self.download_dir.join(format!("downloaded_file_{file_id}"))
    }

    /// Sends `text` to the configured chat.
    pub async fn send_message(&self, text: impl Into<String>) -> Outcome<()> {
        let req = SendMessageRequest::new(self.chat_id.clone(), text);
        report(
            self.api.send_message(&req).await,
            "Couldn't successfully send message",
        )
    }

    /// Fetches and logs the bot's own user record (`getMe`).
    pub async fn get_bot_info(&self) -> Outcome<User> {
        report(
            self.fetch_logged("getMe", &GetMeRequest::default(), "Bot info")
                .await,
            "Couldn't retrieve bot information",
        )
    }

    /// Fetches and logs the profile photos of `user_id`.
    pub async fn get_user_info(&self, user_id: i64) -> Outcome<UserProfilePhotos> {
        let req = GetUserProfilePhotosRequest::new(user_id);
        report(
            self.fetch_logged("getUserProfilePhotos", &req, "User info")
                .await,
            "Couldn't retrieve user information",
        )
    }

    /// Calls `method`, logs its whole `result` under `label` (fields the typed
    /// projection drops included), then reads it as `T`.
    async fn fetch_logged<Req, T>(&self, method: &str, req: &Req, label: &str) -> Result<T>
    where
        Req: Request,
        T: DeserializeOwned,
    {
        let result: Value = self.api.call(method, req).await?;
        info!("{}: {}", label, result);
        serde_json::from_value(result)
            .with_context(|| format!("Unexpected result from /{method}"))
    }

    pub async fn forward_message(
        &self,
        from_chat_id: &str,
        to_chat_id: &str,
        message_id: i64,
    ) -> Outcome<()> {
        let req = ForwardMessageRequest::new(from_chat_id, to_chat_id, message_id);
        let outcome = report(
            self.api.forward_message(&req).await,
            "Couldn't forward message",
        );
        if outcome.is_done() {
            info!("Message forwarded successfully");
        }
        outcome
    }

    pub async fn delete_message(&self, chat_id: &str, message_id: i64) -> Outcome<()> {
        let req = DeleteMessageRequest::new(chat_id, message_id);
        let outcome = report(
            self.api.delete_message(&req).await,
            "Couldn't delete message",
        );
        if outcome.is_done() {
            info!("Message deleted successfully");
        }
        outcome
    }

    /// Fetches every update the server still holds and downloads each attached
    /// document to [`BotClient::download_path`]. Returns the number of download
    /// attempts.
    ///
    /// No offset is sent, so updates are never confirmed: calling this again
    /// sees the same documents, and those downloads fail because the
    /// destination already exists.
    ///
    /// Updates are read one at a time. A malformed update (e.g. a document
    /// without `file_id`) stops processing there: documents before it are
    /// downloaded, the rest are skipped, and the operation fails.
    pub async fn process_updates(&self) -> Outcome<usize> {
        let updates: Vec<Value> = match report(
            self.api
                .call::<_, Vec<Value>>("getUpdates", &GetUpdatesRequest::new())
                .await
                .context("Failed to retrieve updates"),
            "Couldn't process updates",
        ) {
            Outcome::Done(updates) => updates,
            Outcome::Failed(err) => return Outcome::Failed(err),
        };

        debug!("Processing {} updates", updates.len());
        let mut attempts = 0;
        for (i, raw) in updates.into_iter().enumerate() {
            let update: Update = match serde_json::from_value(raw)
                .with_context(|| format!("Malformed update #{i} after {attempts} downloads"))
            {
                Ok(update) => update,
                Err(err) => return report(Err(err), "Couldn't process updates"),
            };

            if let Some(document) = update.document() {
                let destination = self.download_path(&document.file_id);
                // Failures are logged inside; keep going with the rest of the batch.
                let _ = self
                    .download_file_from_channel(&document.file_id, &destination)
                    .await;
                attempts += 1;
            }
        }
        Outcome::Done(attempts)
    }

    /// Resolves `file_id` with `getFile`, streams it into a new file at
    /// `destination`, and schedules that file's deletion. A download whose
    /// deletion can't be scheduled still succeeds; the scheduling failure is
    /// logged on its own.
    pub async fn download_file_from_channel(
        &self,
        file_id: &str,
        destination: &Path,
    ) -> Outcome<Download> {
        report(
            self.try_download(file_id, destination).await,
            "Couldn't download file",
        )
    }

    async fn try_download(&self, file_id: &str, destination: &Path) -> Result<Download> {
        let file = self.api.get_file(&GetFileRequest::new(file_id)).await?;
        let bytes = self.api.download_file(file.path()?, destination).await?;
        info!(
            "Downloaded {} ({} bytes) to {}",
            file_id,
            bytes,
            destination.display()
        );

        let deletion = match self.scheduler.schedule(destination, self.deletion_delay) {
            Ok(task) => Some(task),
            Err(err) => {
                error!(
                    "Couldn't schedule deletion of {}, {:#}",
                    destination.display(),
                    err
                );
                None
            }
        };
        Ok(Download {
            file_id: file_id.to_string(),
            path: destination.to_path_buf(),
            bytes,
            deletion,
        })
    }

    /// Not implemented: the Bot API has no call to list a chat's files.
    pub fn list_files(&self) {
        warn!("Listing recent files is not implemented");
    }
}
