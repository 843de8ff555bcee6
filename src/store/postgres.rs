use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::error::{StoreError, StoreResult};
use crate::model::Id;
use crate::store::traits::RecordStore;

/// Relational records kept as JSONB rows, one table per record kind.
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the record table if it is missing
    pub async fn migrate(&self, table: &str) -> Result<()> {
        let table = checked_table(table)?;
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                row JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            table
        ))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to create table {}", table))?;

        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass
fn checked_table(table: &str) -> StoreResult<&str> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(table)
    } else {
        Err(StoreError::malformed(format!("invalid table name '{}'", table)))
    }
}

fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) => StoreError::rejected(db.to_string()),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::unavailable(err.to_string()),
        other => StoreError::malformed(other.to_string()),
    }
}

#[async_trait::async_trait]
impl RecordStore for PostgresRecordStore {
    async fn insert_record(&self, table: &str, id: &Id, row: Value) -> StoreResult<()> {
        let table = checked_table(table)?;
        sqlx::query(&format!("INSERT INTO {} (id, row) VALUES ($1, $2)", table))
            .bind(id)
            .bind(Json(row))
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn delete_record(&self, table: &str, id: &Id) -> StoreResult<bool> {
        let table = checked_table(table)?;
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_record(&self, table: &str, id: &Id) -> StoreResult<Option<Value>> {
        let table = checked_table(table)?;
        let row = sqlx::query(&format!("SELECT row FROM {} WHERE id = $1", table))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Json(value): Json<Value> = row.try_get("row").map_err(store_error)?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_are_checked() {
        assert!(checked_table("experiment_records").is_ok());
        assert!(checked_table("records; DROP TABLE x").is_err());
        assert!(checked_table("1records").is_err());
        assert!(checked_table("").is_err());
    }
}
