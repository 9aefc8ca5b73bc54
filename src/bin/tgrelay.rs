/// Command-line front end for `tgrelay`. Reads `TELEGRAM_TOKEN` and
/// `TELEGRAM_CHAT_ID` from the environment, runs one operation, and exits.
#[macro_use]
extern crate log;

use std::{process::ExitCode, time::Duration};

use argh::FromArgs;
use tgrelay::*;

#[derive(FromArgs)]
/// Relay messages and files between you and the Telegram Bot API.
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Send(SendArgs),
    Heartbeat(HeartbeatArgs),
    Updates(UpdatesArgs),
    Me(MeArgs),
    User(UserArgs),
    Forward(ForwardArgs),
    Delete(DeleteArgs),
    Files(FilesArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "send")]
/// send a text message to the configured chat
struct SendArgs {
    /// message text
    #[argh(positional)]
    text: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "heartbeat")]
/// send the current time and a random token to the configured chat
struct HeartbeatArgs {}

#[derive(FromArgs)]
#[argh(subcommand, name = "updates")]
/// download every document found in pending updates
struct UpdatesArgs {
    /// keep polling every N seconds until Ctrl-C; downloads are then deleted
    /// on schedule while the process runs
    #[argh(option)]
    interval: Option<u64>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "me")]
/// show the bot's own user record
struct MeArgs {}

#[derive(FromArgs)]
#[argh(subcommand, name = "user")]
/// show a user's profile photos
struct UserArgs {
    /// numeric user id
    #[argh(positional)]
    user_id: i64,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "forward")]
/// forward a message between chats
struct ForwardArgs {
    /// chat the message is in
    #[argh(positional)]
    from_chat_id: String,

    /// chat to forward it to
    #[argh(positional)]
    to_chat_id: String,

    /// message id
    #[argh(positional)]
    message_id: i64,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "delete")]
/// delete a message
struct DeleteArgs {
    /// chat the message is in
    #[argh(positional)]
    chat_id: String,

    /// message id
    #[argh(positional)]
    message_id: i64,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "files")]
/// list recent files (not implemented)
struct FilesArgs {}

async fn run(bot: &BotClient, command: Command) -> bool {
    match command {
        Command::Send(args) => bot.send_message(args.text).await.is_done(),
        Command::Heartbeat(_) => tgrelay::heartbeat::send_heartbeat(bot).await.is_done(),
        Command::Updates(UpdatesArgs { interval: None }) => bot.process_updates().await.is_done(),
        Command::Updates(UpdatesArgs {
            interval: Some(secs),
        }) => {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Outcome::Done(n) = bot.process_updates().await {
                            info!("Processed {} documents", n);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received shutdown signal");
                        break true;
                    }
                }
            }
        }
        Command::Me(_) => bot.get_bot_info().await.is_done(),
        Command::User(args) => bot.get_user_info(args.user_id).await.is_done(),
        Command::Forward(args) => bot
            .forward_message(&args.from_chat_id, &args.to_chat_id, args.message_id)
            .await
            .is_done(),
        Command::Delete(args) => bot
            .delete_message(&args.chat_id, args.message_id)
            .await
            .is_done(),
        Command::Files(_) => {
            bot.list_files();
            true
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tgrelay::init_logger();
    let args: Args = argh::from_env();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let bot = match BotClient::start(config) {
        Ok(bot) => bot,
        Err(err) => {
            error!("Couldn't start bot client: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    let succeeded = run(&bot, args.command).await;
    bot.stop().await;

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
