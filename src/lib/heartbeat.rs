use chrono::{Local, NaiveTime};
use uuid::Uuid;

use crate::bot::{BotClient, Outcome};

/// Composes `Now it is <time>: <token>`, where the token is a random (v4) UUID.
pub fn heartbeat_text() -> String {
    format_heartbeat(Local::now().time(), Uuid::new_v4())
}

fn format_heartbeat(time: NaiveTime, token: Uuid) -> String {
    format!("Now it is {}: {}", time.format("%H:%M:%S%.6f"), token)
}

/// Sends a fresh [`heartbeat_text`] to the bot's configured chat.
pub async fn send_heartbeat(bot: &BotClient) -> Outcome<()> {
    bot.send_message(heartbeat_text()).await
}
