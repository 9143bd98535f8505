//! sysmon-bot
//!
//! Telegram front-end for administering one managed Linux host and one
//! PostgreSQL database from a chat window.
//!
//! # Features
//!
//! - **Remote commands**: fixed menu of diagnostics (`uptime`, `df`,
//!   `journalctl`, `systemctl`, ...) executed over a single-use SSH session
//! - **Contact capture**: phone/email extraction from free text with
//!   store-side deduplication and confirm-before-save buttons
//! - **Password checks**: complexity classification against a fixed policy
//! - **Report formatting**: structured per-record reports, chunked at the
//!   Telegram message limit
//!
//! # Architecture
//!
//! ```text
//! Telegram ──► Dispatcher ──► command handlers ──► RemoteExecutor (ssh2)
//!                  │                          └──► PgStore (tokio-postgres)
//!                  └── DialogState map (per-chat conversations)
//! ```

pub mod config;
pub mod db;
pub mod dialog;
pub mod extract;
pub mod password;
pub mod report;
pub mod ssh;
pub mod telegram;
pub mod telegram_ui;

pub use config::Config;
pub use db::{ContactStore, PgStore, StoreError};
pub use dialog::{DialogState, Turn};
pub use extract::{find_emails, find_phone_numbers, format_phone_number};
pub use password::{classify, Strength};
pub use ssh::{CommandRunner, ExecError, RemoteExecutor};
