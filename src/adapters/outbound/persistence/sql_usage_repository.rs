use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::error::map_sqlx_error;
use crate::{
    domain::{
        errors::{RepositoryResult, Resource},
        models::{UsageDelta, UsageSnapshot, UsageStats},
    },
    ports::repositories::UsageRepository,
};

/// PostgreSQL implementation of UsageRepository
///
/// Counter updates are single upsert statements, so concurrent deltas on
/// the same bucket serialize on the row lock.
#[derive(Clone)]
pub struct SqlUsageRepository {
    pool: PgPool,
}

impl SqlUsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn snapshot_from_row(row: &PgRow) -> Result<UsageSnapshot, sqlx::Error> {
    Ok(UsageSnapshot {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        total_bytes: row.try_get("total_bytes")?,
        file_count: row.try_get("file_count")?,
        captured_at: row.try_get("captured_at")?,
    })
}

#[async_trait]
impl UsageRepository for SqlUsageRepository {
    async fn ensure_usage_row(&self, bucket_id: Uuid) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bucket_usage (bucket_id, total_bytes, file_count)
            VALUES ($1, 0, 0)
            ON CONFLICT (bucket_id) DO NOTHING
            "#,
        )
        .bind(bucket_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::Bucket))?;

        Ok(())
    }

    async fn apply_delta(&self, bucket_id: Uuid, delta: UsageDelta) -> RepositoryResult<UsageStats> {
        let row = sqlx::query(
            r#"
            INSERT INTO bucket_usage (bucket_id, total_bytes, file_count, updated_at)
            VALUES ($1, GREATEST($2, 0), GREATEST($3, 0), NOW())
            ON CONFLICT (bucket_id) DO UPDATE SET
                total_bytes = GREATEST(bucket_usage.total_bytes + $2, 0),
                file_count = GREATEST(bucket_usage.file_count + $3, 0),
                updated_at = NOW()
            RETURNING total_bytes, file_count
            "#,
        )
        .bind(bucket_id)
        .bind(delta.bytes)
        .bind(delta.files)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::Bucket))?;

        Ok(UsageStats {
            total_bytes: row
                .try_get("total_bytes")
                .map_err(|e| map_sqlx_error(e, Resource::UsageCounter))?,
            file_count: row
                .try_get("file_count")
                .map_err(|e| map_sqlx_error(e, Resource::UsageCounter))?,
        })
    }

    async fn get_usage(&self, bucket_id: Uuid) -> RepositoryResult<UsageStats> {
        let row = sqlx::query("SELECT total_bytes, file_count FROM bucket_usage WHERE bucket_id = $1")
            .bind(bucket_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, Resource::UsageCounter))?;

        match row {
            Some(row) => Ok(UsageStats {
                total_bytes: row
                    .try_get("total_bytes")
                    .map_err(|e| map_sqlx_error(e, Resource::UsageCounter))?,
                file_count: row
                    .try_get("file_count")
                    .map_err(|e| map_sqlx_error(e, Resource::UsageCounter))?,
            }),
            None => Ok(UsageStats::default()),
        }
    }

    async fn record_snapshot(&self, owner_id: Uuid) -> RepositoryResult<UsageSnapshot> {
        let row = sqlx::query(
            r#"
            WITH totals AS (
                SELECT COALESCE(SUM(u.total_bytes), 0)::BIGINT AS total_bytes,
                       COALESCE(SUM(u.file_count), 0)::BIGINT AS file_count
                FROM buckets b
                JOIN bucket_usage u ON u.bucket_id = b.id
                WHERE b.owner_id = $2
            )
            INSERT INTO usage_snapshots (id, owner_id, total_bytes, file_count, captured_at)
            SELECT $1, $2, totals.total_bytes, totals.file_count, NOW()
            FROM totals
            RETURNING id, owner_id, total_bytes, file_count, captured_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::UsageCounter))?;

        snapshot_from_row(&row).map_err(|e| map_sqlx_error(e, Resource::UsageCounter))
    }

    async fn list_snapshots(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> RepositoryResult<Vec<UsageSnapshot>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, total_bytes, file_count, captured_at
            FROM usage_snapshots
            WHERE owner_id = $1
            ORDER BY captured_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::UsageCounter))?;

        rows.iter()
            .map(snapshot_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error(e, Resource::UsageCounter))
    }
}
