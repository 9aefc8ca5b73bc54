//! `tgrelay` relays messages and files between an application and the
//! Telegram Bot API.
//!
//! # Components
//!
//! - [`BotClient`] is the entry point. It sends messages, forwards and deletes
//! them, fetches bot and user metadata, and downloads documents found in
//! incoming updates. Every operation is best-effort: failures are logged and
//! reported as an [`Outcome`], never as a panic.
//!
//! - [`API`] is the typed layer underneath, one method per Telegram call, and
//! [`Client`] is the HTTP shim it talks through. All calls are GET requests
//! with query parameters, answered with an [`ApiResponse`] envelope.
//!
//! - [`scheduler::DeletionScheduler`] deletes downloaded files after a delay
//! (30 minutes by default) on a single background worker.
//!
//! - [`fake::FakeServer`] stands in for Telegram in tests.
//!
//! # Example
//!
//! ```no_run
//! use tgrelay::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     tgrelay::init_logger();
//!     let bot = BotClient::start(Config::from_env()?)?;
//!
//!     bot.send_message("Hello world!").await;
//!     bot.process_updates().await;
//!
//!     bot.stop().await;
//!     Ok(())
//! }
//! ```

#[macro_use]
extern crate log;

pub mod api;
pub mod bot;
pub mod client;
pub mod config;
pub mod fake;
pub mod heartbeat;
pub mod scheduler;

pub use api::api::*;
pub use bot::*;
pub use client::*;
pub use config::*;

/// This method initializes [`env_logger`] from the environment, defaulting to `info` level logging.
pub fn init_logger() {
    // We use try_init here so it can by run by tests.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
    debug!("Logger initialized.");
}
