//! Telegram front-end: dispatcher wiring, command handlers, dialogs.
//!
//! Uses an explicit Dispatcher with two branches (messages and callback
//! queries). All per-chat conversation state lives in `BotData`; the
//! handlers flatten executor/store errors into reply text so every
//! update gets exactly one (possibly chunked) response.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt},
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    types::Update,
};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::{ContactStore, PgStore};
use crate::dialog::{self, DialogState, Turn};
use crate::report;
use crate::ssh::{CommandRunner, RemoteExecutor};
use crate::telegram_ui::{confirmation_keyboard, ButtonAction};

const HELP_TEXT: &str = "Available commands:\n\
    /find_phone_number - Search a message for phone numbers\n\
    /find_email - Search a message for email addresses\n\
    /verify_password - Check password complexity\n\
    /get_release - OS release info over SSH\n\
    /get_uname - Kernel and architecture over SSH\n\
    /get_uptime - Host uptime over SSH\n\
    /get_df - Filesystem usage over SSH\n\
    /get_free - Memory usage over SSH\n\
    /get_mpstat - CPU statistics over SSH\n\
    /get_w - Logged-in users over SSH\n\
    /get_auths - Last 10 logins over SSH\n\
    /get_critical - Last 5 critical journal events over SSH\n\
    /get_ps - Running processes over SSH\n\
    /get_ss - Open sockets over SSH\n\
    /get_apt_list - Installed packages (all or by name) over SSH\n\
    /get_services - Running services over SSH\n\
    /get_repl_logs - Database replication log entries\n\
    /get_emails - Stored email addresses\n\
    /get_phone_numbers - Stored phone numbers\n\
    /cancel - Cancel the current dialog";

struct BotData {
    allowed_users: Vec<i64>,
    executor: RemoteExecutor,
    store: PgStore,
    /// Active conversation per chat; absent entry = no conversation.
    dialogs: RwLock<HashMap<ChatId, DialogState>>,
}

impl BotData {
    fn is_allowed(&self, user_id: i64) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(&user_id)
    }
}

/// Run the bot with long polling until interrupted.
pub async fn run_bot(config: Config) -> Result<()> {
    let bot = Bot::new(config.bot_token.clone());

    tracing::info!("Verifying bot token...");
    let me = bot.get_me().await?;
    tracing::info!(
        "Bot authenticated: @{} (ID: {})",
        me.username.as_deref().unwrap_or("unknown"),
        me.id
    );

    // Clear any webhook so polling receives updates.
    if let Err(e) = bot.delete_webhook().await {
        tracing::warn!("Failed to delete webhook: {} (continuing anyway)", e);
    }

    tracing::info!(
        "Allowed users: {}",
        if config.allowed_users.is_empty() {
            "ALL".to_string()
        } else {
            format!("{:?}", config.allowed_users)
        }
    );
    tracing::info!("Managed host: {}:{}", config.ssh.host, config.ssh.port);

    let data = Arc::new(BotData {
        allowed_users: config.allowed_users.clone(),
        executor: RemoteExecutor::new(config.ssh.clone()),
        store: PgStore::new(config.db.clone()),
        dialogs: RwLock::new(HashMap::new()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    tracing::info!("Starting dispatcher with long polling...");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![data])
        .default_handler(|upd| async move {
            tracing::debug!("Unhandled update: {:?}", upd);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::warn!("Dispatcher stopped");
    Ok(())
}

/// Message handler endpoint for the dispatcher
async fn message_handler(bot: Bot, msg: Message, data: Arc<BotData>) -> ResponseResult<()> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);
    let chat_id = msg.chat.id;

    if !data.is_allowed(user_id) {
        tracing::warn!("Unauthorized user: {}", user_id);
        bot.send_message(chat_id, "Unauthorized.").await?;
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };
    tracing::info!(
        "Message received: user={}, chat={}, text={:?}",
        user_id,
        chat_id,
        text.chars().take(50).collect::<String>()
    );

    if let Err(e) = handle_text(&bot, &msg, &data, text).await {
        tracing::error!("Error handling message: {:#}", e);
    }
    Ok(())
}

async fn handle_text(bot: &Bot, msg: &Message, data: &BotData, text: &str) -> Result<()> {
    let chat_id = msg.chat.id;

    if text.starts_with('/') {
        return handle_command(bot, msg, data, text).await;
    }

    // Free text feeds whichever conversation is active for this chat.
    let state = data.dialogs.read().await.get(&chat_id).cloned();
    match state {
        Some(DialogState::AwaitPhoneText) => {
            let turn = dialog::phone_text(&data.store, text).await;
            apply_turn(bot, chat_id, data, turn).await?;
        }
        Some(DialogState::AwaitEmailText) => {
            let turn = dialog::email_text(&data.store, text).await;
            apply_turn(bot, chat_id, data, turn).await?;
        }
        Some(DialogState::AwaitPackage) => {
            let turn = dialog::package_text(&data.executor, text).await;
            apply_turn(bot, chat_id, data, turn).await?;
        }
        Some(DialogState::AwaitPassword) => {
            apply_turn(bot, chat_id, data, dialog::password_text(text)).await?;
        }
        Some(DialogState::ConfirmPhones { .. }) | Some(DialogState::ConfirmEmails { .. }) => {
            bot.send_message(chat_id, "Use the Save or Cancel buttons above, or /cancel.")
                .await?;
        }
        None => {
            // No active conversation: echo the text back.
            bot.send_message(chat_id, text).await?;
        }
    }
    Ok(())
}

/// Render one dialog turn: send the reply and update the state map.
async fn apply_turn(bot: &Bot, chat_id: ChatId, data: &BotData, turn: Turn) -> Result<()> {
    match turn {
        Turn::End(reply) => {
            data.dialogs.write().await.remove(&chat_id);
            send_long_message(bot, chat_id, &reply).await?;
        }
        Turn::Continue(reply) => {
            bot.send_message(chat_id, reply).await?;
        }
        Turn::AwaitConfirm { message, next } => {
            let save = match &next {
                DialogState::ConfirmPhones { .. } => ButtonAction::SavePhones,
                _ => ButtonAction::SaveEmails,
            };
            data.dialogs.write().await.insert(chat_id, next);
            bot.send_message(chat_id, message)
                .reply_markup(confirmation_keyboard(save))
                .await?;
        }
    }
    Ok(())
}

async fn handle_command(bot: &Bot, msg: &Message, data: &BotData, text: &str) -> Result<()> {
    let chat_id = msg.chat.id;
    let cmd = text.split_whitespace().next().unwrap_or(text);
    tracing::info!("Command: {}", cmd);

    match cmd {
        "/start" => {
            let name = msg
                .from
                .as_ref()
                .map(|u| u.full_name())
                .unwrap_or_else(|| "operator".to_string());
            bot.send_message(
                chat_id,
                format!("Hello, {}! Send /help to see what this bot can do.", name),
            )
            .await?;
        }

        "/help" => {
            bot.send_message(chat_id, HELP_TEXT).await?;
        }

        "/cancel" => {
            data.dialogs.write().await.remove(&chat_id);
            bot.send_message(chat_id, "Command cancelled.").await?;
        }

        "/find_phone_number" => {
            data.dialogs
                .write()
                .await
                .insert(chat_id, DialogState::AwaitPhoneText);
            bot.send_message(chat_id, "Enter text to search for phone numbers:")
                .await?;
        }

        "/find_email" => {
            data.dialogs
                .write()
                .await
                .insert(chat_id, DialogState::AwaitEmailText);
            bot.send_message(chat_id, "Enter text to search for email addresses:")
                .await?;
        }

        "/verify_password" => {
            data.dialogs
                .write()
                .await
                .insert(chat_id, DialogState::AwaitPassword);
            bot.send_message(
                chat_id,
                "Enter a password to check. Send /cancel to leave the check.",
            )
            .await?;
        }

        "/get_apt_list" => {
            data.dialogs
                .write()
                .await
                .insert(chat_id, DialogState::AwaitPackage);
            bot.send_message(
                chat_id,
                "Send 'all' to list every installed package, or a package name.",
            )
            .await?;
        }

        "/get_release" => run_and_reply(bot, chat_id, data, "cat /etc/os-release").await?,
        "/get_uname" => run_and_reply(bot, chat_id, data, "uname -a").await?,
        "/get_uptime" => run_and_reply(bot, chat_id, data, "uptime").await?,
        "/get_df" => run_and_reply(bot, chat_id, data, "df -h").await?,
        "/get_free" => run_and_reply(bot, chat_id, data, "free -h").await?,
        "/get_mpstat" => run_and_reply(bot, chat_id, data, "mpstat").await?,
        "/get_w" => run_and_reply(bot, chat_id, data, "w").await?,
        "/get_critical" => run_and_reply(bot, chat_id, data, "journalctl -r -p crit -n 5").await?,
        "/get_ps" => run_and_reply(bot, chat_id, data, "ps").await?,

        "/get_auths" => {
            run_formatted(bot, chat_id, data, "last -i -n 10", report::format_auths).await?
        }
        "/get_ss" => run_formatted(bot, chat_id, data, "ss -n", report::format_sockets).await?,
        "/get_services" => {
            run_formatted(
                bot,
                chat_id,
                data,
                "systemctl list-units --type=service --state=running",
                report::format_services,
            )
            .await?
        }

        "/get_repl_logs" => match data.executor.run("docker logs db_image").await {
            Ok(raw) => {
                let lines = report::replication_lines(&raw);
                if lines.is_empty() {
                    bot.send_message(chat_id, "No replication entries in the logs.")
                        .await?;
                } else {
                    for line in lines {
                        bot.send_message(chat_id, line).await?;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("replication log fetch failed: {}", e);
                bot.send_message(chat_id, format!("Error: {}", e)).await?;
            }
        },

        "/get_phone_numbers" => match data.store.all_phones().await {
            Ok(rows) if rows.is_empty() => {
                bot.send_message(chat_id, "No phone numbers stored yet.")
                    .await?;
            }
            Ok(rows) => send_long_message(bot, chat_id, &report::numbered_list(&rows)).await?,
            Err(e) => {
                tracing::error!("phone listing failed: {:#}", e);
                bot.send_message(chat_id, "Failed to read the database.")
                    .await?;
            }
        },

        "/get_emails" => match data.store.all_emails().await {
            Ok(rows) if rows.is_empty() => {
                bot.send_message(chat_id, "No email addresses stored yet.")
                    .await?;
            }
            Ok(rows) => send_long_message(bot, chat_id, &report::numbered_list(&rows)).await?,
            Err(e) => {
                tracing::error!("email listing failed: {:#}", e);
                bot.send_message(chat_id, "Failed to read the database.")
                    .await?;
            }
        },

        _ => {
            bot.send_message(chat_id, "Unknown command. Send /help for the list.")
                .await?;
        }
    }
    Ok(())
}

/// One-shot command: run over SSH and reply with the flattened output.
async fn run_and_reply(bot: &Bot, chat_id: ChatId, data: &BotData, command: &str) -> Result<()> {
    run_formatted(bot, chat_id, data, command, |raw| raw.to_string()).await
}

/// One-shot command with a report formatter on the success path.
async fn run_formatted(
    bot: &Bot,
    chat_id: ChatId,
    data: &BotData,
    command: &str,
    format: fn(&str) -> String,
) -> Result<()> {
    match data.executor.run(command).await {
        Ok(raw) => send_long_message(bot, chat_id, &format(&raw)).await,
        Err(e) => {
            tracing::warn!("remote command {:?} failed: {}", command, e);
            bot.send_message(chat_id, format!("Error: {}", e)).await?;
            Ok(())
        }
    }
}

/// Callback query handler for the save/cancel inline buttons.
async fn callback_handler(bot: Bot, query: CallbackQuery, data: Arc<BotData>) -> ResponseResult<()> {
    let user_id = query.from.id.0 as i64;
    if !data.is_allowed(user_id) {
        bot.answer_callback_query(&query.id)
            .text("Unauthorized")
            .await?;
        return Ok(());
    }

    let action = query.data.as_deref().and_then(ButtonAction::decode);
    let chat_id = query.message.as_ref().map(|m| m.chat().id);
    bot.answer_callback_query(&query.id).await?;

    let (Some(action), Some(chat_id)) = (action, chat_id) else {
        return Ok(());
    };
    tracing::info!("Callback: chat={}, action={:?}", chat_id, action);

    // Every branch is terminal for the conversation.
    let state = data.dialogs.write().await.remove(&chat_id);
    let reply = match (action, state) {
        (ButtonAction::SavePhones, Some(DialogState::ConfirmPhones { pending })) => {
            dialog::confirm_phones(&data.store, &pending).await
        }
        (ButtonAction::SaveEmails, Some(DialogState::ConfirmEmails { pending })) => {
            dialog::confirm_emails(&data.store, &pending).await
        }
        (ButtonAction::Cancel, _) => "Save cancelled.".to_string(),
        _ => "Nothing to save.".to_string(),
    };

    // Replace the button prompt with the outcome where possible.
    if let Some(m) = query.message.as_ref() {
        if bot
            .edit_message_text(chat_id, m.id(), reply.clone())
            .await
            .is_err()
        {
            bot.send_message(chat_id, reply).await?;
        }
    } else {
        bot.send_message(chat_id, reply).await?;
    }
    Ok(())
}

/// Send a reply, splitting it into ordered chunks when it exceeds the
/// Telegram message limit.
async fn send_long_message(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    if text.is_empty() {
        bot.send_message(chat_id, "(no output)").await?;
        return Ok(());
    }
    for chunk in report::split_message(text) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}
