//! Checks what BotClient writes to the log. Installs its own `log::Log`, so it
//! lives in a separate test binary from everything that calls `init_logger`.
use std::{
    cell::RefCell,
    sync::{Arc, Mutex, Once},
};

use anyhow::Result;
use log::{Level, LevelFilter, Log, Metadata, Record};
use tgrelay::*;

thread_local! {
    static LINES: RefCell<Vec<(Level, String)>> = RefCell::new(vec![]);
}

/// Records log lines per thread. `#[tokio::test]` runs each test on its own
/// single-threaded runtime, so tests don't see each other's lines.
struct Capture;

impl Log for Capture {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        LINES.with(|l| {
            l.borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture;

fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    LINES.with(|l| l.borrow_mut().clear());
}

fn lines_at(level: Level) -> Vec<String> {
    LINES.with(|l| {
        l.borrow()
            .iter()
            .filter(|(lvl, _)| *lvl == level)
            .map(|(_, line)| line.clone())
            .collect()
    })
}

/// A bot whose transport always answers `body`, recording requested URLs.
fn bot_answering(body: &'static str) -> (BotClient, Arc<Mutex<Vec<String>>>) {
    let urls = Arc::new(Mutex::new(vec![]));
    let recorder = Arc::clone(&urls);
    let client = Client::new("T".to_string()).with_get_handler_fn(
        move |_: String, url: String| -> Result<String> {
            recorder.lock().unwrap().push(url);
            Ok(body.to_string())
        },
    );
    (
        BotClient::with_client(client, Config::new("T".to_string(), "123")),
        urls,
    )
}

#[tokio::test]
async fn send_message_ok() {
    capture_logs();
    let (bot, urls) = bot_answering(r#"{"ok":true}"#);

    assert!(bot.send_message("hello").await.is_done());

    assert_eq!(
        *urls.lock().unwrap(),
        vec!["https://api.telegram.org/botT/sendMessage?chat_id=123&text=hello".to_string()]
    );
    assert!(lines_at(Level::Error).is_empty());
    bot.stop().await;
}

#[tokio::test]
async fn send_message_not_ok() {
    capture_logs();
    let (bot, _) = bot_answering(r#"{"ok":false}"#);

    assert!(bot.send_message("hello").await.is_failed());

    let errors = lines_at(Level::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Couldn't successfully send message"));
    bot.stop().await;
}

#[tokio::test]
async fn info_results_are_logged() {
    capture_logs();
    let (bot, _) = bot_answering(
        r#"{"ok":true,"result":{"id":99,"is_bot":true,"first_name":"Relay","username":"relay_bot"}}"#,
    );

    assert!(bot.get_bot_info().await.is_done());

    assert!(lines_at(Level::Info)
        .iter()
        .any(|l| l.starts_with("Bot info:") && l.contains("relay_bot")));
    assert!(lines_at(Level::Error).is_empty());
    bot.stop().await;
}

#[tokio::test]
async fn info_logs_keep_the_whole_payload() {
    capture_logs();
    let (bot, _) = bot_answering(
        r#"{"ok":true,"result":{"id":99,"is_bot":true,"first_name":"Relay","can_join_groups":false,"supports_inline_queries":true,"total_count":0,"photos":[]}}"#,
    );

    let me = bot.get_bot_info().await.ok().unwrap();
    assert_eq!(me.id, 99);
    assert!(bot.get_user_info(99).await.is_done());

    let info = lines_at(Level::Info);
    let bot_line = info.iter().find(|l| l.starts_with("Bot info:")).unwrap();
    assert!(bot_line.contains(r#""can_join_groups":false"#));
    assert!(bot_line.contains(r#""supports_inline_queries":true"#));
    let user_line = info.iter().find(|l| l.starts_with("User info:")).unwrap();
    assert!(user_line.contains(r#""total_count":0"#));
    assert!(lines_at(Level::Error).is_empty());
    bot.stop().await;
}

#[tokio::test]
async fn failures_are_logged_once_per_operation() {
    capture_logs();
    let (bot, _) = bot_answering(r#"{"ok":false,"description":"Forbidden"}"#);

    bot.forward_message("1", "2", 3).await;
    bot.delete_message("1", 3).await;
    bot.get_user_info(4).await;
    bot.process_updates().await;

    let errors = lines_at(Level::Error);
    assert_eq!(errors.len(), 4);
    assert!(errors[0].starts_with("Couldn't forward message"));
    assert!(errors[1].starts_with("Couldn't delete message"));
    assert!(errors[2].starts_with("Couldn't retrieve user information"));
    assert!(errors[3].starts_with("Couldn't process updates"));
    assert!(errors.iter().all(|l| l.contains("Forbidden")));
    assert!(lines_at(Level::Info)
        .iter()
        .all(|l| !l.contains("successfully")));
    bot.stop().await;
}

#[tokio::test]
async fn token_stays_out_of_the_log() {
    capture_logs();
    let client = Client::new("super-secret".to_string())
        .with_get_handler_fn(|_: String, _: String| -> Result<String> {
            Ok(r#"{"ok":true}"#.to_string())
        });
    let bot = BotClient::with_client(client, Config::new("super-secret".to_string(), "123"));

    bot.send_message("hello").await;
    bot.stop().await;

    LINES.with(|l| assert!(l.borrow().iter().all(|(_, line)| !line.contains("super-secret"))));
}
