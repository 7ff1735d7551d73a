use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::StateRow;
use crate::traits::StatusStore;

/// `sharding_state` table as a [`StatusStore`].
#[derive(Clone)]
pub struct StateRepository {
    pool: SqlitePool,
}

impl StateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_key(&self, key: &str) -> Result<Option<StateRow>> {
        let row: Option<StateRow> = sqlx::query_as(
            r#"
            SELECT key, value, updated_at
            FROM sharding_state
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl StatusStore for StateRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.find_by_key(key).await?.map(|row| row.value))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sharding_state (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sharding_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
