use async_trait::async_trait;
use shard_core::ResourceDescriptor;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::ResourceRow;
use crate::traits::Catalog;

/// `resources` table as a [`Catalog`].
#[derive(Clone)]
pub struct ResourceRepository {
    pool: SqlitePool,
}

impl ResourceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for ResourceRepository {
    async fn describe(&self, name: &str) -> Result<Option<ResourceDescriptor>> {
        let row: Option<ResourceRow> = sqlx::query_as(
            r#"
            SELECT name, cluster, structure, extra, shard_count, replication_factor, created_at
            FROM resources
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ResourceRow::into_domain).transpose()
    }

    async fn register(&self, descriptor: &ResourceDescriptor) -> Result<bool> {
        let row = ResourceRow::from(descriptor);

        let result = sqlx::query(
            r#"
            INSERT INTO resources (name, cluster, structure, extra, shard_count, replication_factor, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(&row.name)
        .bind(&row.cluster)
        .bind(&row.structure)
        .bind(&row.extra)
        .bind(row.shard_count)
        .bind(row.replication_factor)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<ResourceDescriptor>> {
        let rows: Vec<ResourceRow> = sqlx::query_as(
            r#"
            SELECT name, cluster, structure, extra, shard_count, replication_factor, created_at
            FROM resources
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ResourceRow::into_domain).collect()
    }
}
