//! Configuration management

use anyhow::{Context, Result};

/// Bot configuration, loaded once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token
    pub bot_token: String,

    /// Telegram user ids allowed to talk to the bot (empty = everyone)
    pub allowed_users: Vec<i64>,

    /// Managed host reachable over SSH
    pub ssh: SshConfig,

    /// PostgreSQL database holding captured contacts
    pub db: DbConfig,
}

#[derive(Debug, Clone)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let bot_token = std::env::var("TOKEN").context("TOKEN must be set")?;

        let allowed_users =
            parse_allowed_users(&std::env::var("BOT_ALLOWED_USERS").unwrap_or_default());

        let ssh = SshConfig {
            host: std::env::var("RM_HOST").context("RM_HOST must be set")?,
            port: std::env::var("RM_PORT")
                .context("RM_PORT must be set")?
                .parse()
                .context("RM_PORT must be a port number")?,
            username: std::env::var("RM_USER").context("RM_USER must be set")?,
            password: std::env::var("RM_PASSWORD").context("RM_PASSWORD must be set")?,
        };

        let db = DbConfig {
            host: std::env::var("DB_HOST").context("DB_HOST must be set")?,
            port: std::env::var("DB_PORT")
                .context("DB_PORT must be set")?
                .parse()
                .context("DB_PORT must be a port number")?,
            user: std::env::var("DB_USER").context("DB_USER must be set")?,
            password: std::env::var("DB_PASSWORD").context("DB_PASSWORD must be set")?,
            database: std::env::var("DB_DATABASE").context("DB_DATABASE must be set")?,
        };

        Ok(Self {
            bot_token,
            allowed_users,
            ssh,
            db,
        })
    }
}

fn parse_allowed_users(raw: &str) -> Vec<i64> {
    raw.split(',').filter_map(|s| s.trim().parse().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_allowed_users_csv() {
        assert_eq!(
            parse_allowed_users("12345, 67890, 11111"),
            vec![12345i64, 67890, 11111]
        );
    }

    #[test]
    fn parse_empty_allowed_users() {
        assert!(parse_allowed_users("").is_empty());
    }

    #[test]
    fn parse_skips_invalid_entries() {
        assert_eq!(
            parse_allowed_users("12345, invalid, 67890, , -1"),
            vec![12345i64, 67890, -1]
        );
    }
}
