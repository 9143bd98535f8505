//! PostgreSQL store gateway.
//!
//! One short-lived connection per call: connect, run one parameterized
//! statement, drop the client. No pooling, no transactions.

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

use crate::config::DbConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

/// Persistence operations the dialogs depend on.
///
/// `existing_*` return the subset of `candidates` already present, in
/// candidate order, so callers can filter without a second query.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn existing_phones(&self, candidates: &[String]) -> Result<Vec<String>>;
    async fn insert_phone(&self, canonical: &str) -> Result<()>;
    async fn all_phones(&self) -> Result<Vec<String>>;

    async fn existing_emails(&self, candidates: &[String]) -> Result<Vec<String>>;
    async fn insert_email(&self, email: &str) -> Result<()>;
    async fn all_emails(&self) -> Result<Vec<String>>;
}

#[derive(Clone)]
pub struct PgStore {
    config: DbConfig,
}

impl PgStore {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<tokio_postgres::Client, StoreError> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.config.host)
            .port(self.config.port)
            .user(&self.config.user)
            .password(&self.config.password)
            .dbname(&self.config.database);

        let (client, connection) = pg.connect(NoTls).await?;

        // The connection task finishes once the client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!("postgres connection closed with error: {}", e);
            }
        });

        Ok(client)
    }

    /// Run one SELECT and return all rows.
    pub async fn fetch(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, StoreError> {
        let client = self.connect().await?;
        Ok(client.query(sql, params).await?)
    }

    /// Run one statement for its side effect.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<(), StoreError> {
        let client = self.connect().await?;
        client.execute(sql, params).await?;
        Ok(())
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn existing_phones(&self, candidates: &[String]) -> Result<Vec<String>> {
        let mut existing = Vec::new();
        for number in candidates {
            let rows = self
                .fetch(
                    "SELECT phone_number FROM phone_numbers WHERE phone_number = $1",
                    &[number],
                )
                .await?;
            if !rows.is_empty() {
                existing.push(number.clone());
            }
        }
        Ok(existing)
    }

    async fn insert_phone(&self, canonical: &str) -> Result<()> {
        self.execute(
            "INSERT INTO phone_numbers (phone_number) VALUES ($1)",
            &[&canonical],
        )
        .await?;
        Ok(())
    }

    async fn all_phones(&self) -> Result<Vec<String>> {
        let rows = self
            .fetch("SELECT phone_number FROM phone_numbers", &[])
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn existing_emails(&self, candidates: &[String]) -> Result<Vec<String>> {
        let mut existing = Vec::new();
        for email in candidates {
            let rows = self
                .fetch(
                    "SELECT email FROM email_addresses WHERE email = $1",
                    &[email],
                )
                .await?;
            if !rows.is_empty() {
                existing.push(email.clone());
            }
        }
        Ok(existing)
    }

    async fn insert_email(&self, email: &str) -> Result<()> {
        self.execute("INSERT INTO email_addresses (email) VALUES ($1)", &[&email])
            .await?;
        Ok(())
    }

    async fn all_emails(&self) -> Result<Vec<String>> {
        let rows = self.fetch("SELECT email FROM email_addresses", &[]).await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}
