//! SQL — PostgreSQL event sink.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use super::traits::{EventSink, SinkError, SinkFuture};
use crate::pipeline::AuditEvent;

pub const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// `table` or `schema.table`, each part a plain SQL identifier.
pub fn is_valid_table_name(name: &str) -> bool {
    fn is_ident(part: &str) -> bool {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2 && parts.iter().all(|p| is_ident(p))
}

/// Parameterized insert for one event.
pub fn insert_statement(table: &str) -> Result<String, SinkError> {
    if !is_valid_table_name(table) {
        return Err(SinkError::InvalidTable(table.to_string()));
    }
    Ok(format!(
        "INSERT INTO {table} \
         (event_at, auth_token, ip_address, event_type, api_version, api, api_id, concept, concept_id, action) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
    ))
}

pub struct SqlSink {
    pool: PgPool,
    insert: String,
}

impl SqlSink {
    /// Open the pool and verify the database answers.
    pub async fn connect(connection_string: &str, table: &str) -> Result<Self, SinkError> {
        let insert = insert_statement(table)?;

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(connection_string)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        tracing::info!(max_connections = MAX_CONNECTIONS, table, "Database connection pool created");

        Ok(Self { pool, insert })
    }

    pub fn with_pool(pool: PgPool, table: &str) -> Result<Self, SinkError> {
        Ok(Self {
            pool,
            insert: insert_statement(table)?,
        })
    }
}

impl EventSink for SqlSink {
    fn write<'a>(&'a self, event: &'a AuditEvent) -> SinkFuture<'a> {
        Box::pin(async move {
            let route = &event.route;
            sqlx::query(&self.insert)
                .bind(event.received_at)
                .bind(&event.auth_token)
                .bind(&event.ip)
                .bind(&event.method)
                .bind(&route.api_version)
                .bind(&route.api)
                .bind(&route.api_id)
                .bind(route.concept.as_deref())
                .bind(route.concept_id)
                .bind(route.action.as_deref())
                .execute(&self.pool)
                .await?;
            Ok(())
        })
    }

    fn close(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(self.pool.close())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_table_names() {
        assert!(is_valid_table_name("event_logs"));
        assert!(is_valid_table_name("audit.event_logs"));
        assert!(is_valid_table_name("_events2"));
    }

    #[test]
    fn test_invalid_table_names() {
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("2events"));
        assert!(!is_valid_table_name("a.b.c"));
        assert!(!is_valid_table_name("audit."));
        assert!(!is_valid_table_name("event logs"));
        assert!(!is_valid_table_name("event_logs;--"));
        assert!(!is_valid_table_name("\"event_logs\""));
    }

    #[test]
    fn test_insert_statement_columns() {
        let sql = insert_statement("event_logs").unwrap();
        assert!(sql.starts_with("INSERT INTO event_logs (event_at, auth_token, ip_address, event_type,"));
        assert!(sql.ends_with("($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"));
    }

    #[test]
    fn test_insert_statement_rejects_injection() {
        let err = insert_statement("event_logs; DROP TABLE x").unwrap_err();
        assert!(matches!(err, SinkError::InvalidTable(_)));
    }

    #[tokio::test]
    async fn test_lazy_pool_sink_builds() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://audit@localhost/audit")
            .expect("lazy pool");
        assert!(SqlSink::with_pool(pool.clone(), "event_logs").is_ok());
        assert!(SqlSink::with_pool(pool, "bad name").is_err());
    }
}
