use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::error::map_sqlx_error;
use crate::{
    domain::{
        errors::{RepositoryResult, Resource},
        models::{Bucket, NewBucket, UsageStats},
    },
    ports::repositories::BucketRepository,
};

const BUCKET_COLUMNS: &str = r#"
    b.id, b.owner_id, b.name, b.description, b.created_at, b.updated_at,
    COALESCE(u.total_bytes, 0) AS total_bytes,
    COALESCE(u.file_count, 0) AS file_count
"#;

/// PostgreSQL implementation of BucketRepository
#[derive(Clone)]
pub struct SqlBucketRepository {
    pool: PgPool,
}

impl SqlBucketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn bucket_from_row(row: &PgRow) -> Result<Bucket, sqlx::Error> {
    Ok(Bucket {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        usage: UsageStats {
            total_bytes: row.try_get("total_bytes")?,
            file_count: row.try_get("file_count")?,
        },
    })
}

#[async_trait]
impl BucketRepository for SqlBucketRepository {
    async fn create_bucket(&self, bucket: &NewBucket) -> RepositoryResult<Bucket> {
        let row = sqlx::query(
            r#"
            INSERT INTO buckets (id, owner_id, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, name, description, created_at, updated_at,
                      0::BIGINT AS total_bytes, 0::BIGINT AS file_count
            "#,
        )
        .bind(bucket.id)
        .bind(bucket.owner_id)
        .bind(bucket.name.as_str())
        .bind(&bucket.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::Bucket))?;

        bucket_from_row(&row).map_err(|e| map_sqlx_error(e, Resource::Bucket))
    }

    async fn list_buckets(&self, owner_id: Uuid) -> RepositoryResult<Vec<Bucket>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BUCKET_COLUMNS}
            FROM buckets b
            LEFT JOIN bucket_usage u ON u.bucket_id = b.id
            WHERE b.owner_id = $1
            ORDER BY b.created_at ASC, b.name ASC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::Bucket))?;

        rows.iter()
            .map(bucket_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error(e, Resource::Bucket))
    }

    async fn get_bucket(&self, owner_id: Uuid, bucket_id: Uuid) -> RepositoryResult<Option<Bucket>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {BUCKET_COLUMNS}
            FROM buckets b
            LEFT JOIN bucket_usage u ON u.bucket_id = b.id
            WHERE b.id = $1 AND b.owner_id = $2
            "#
        ))
        .bind(bucket_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::Bucket))?;

        row.as_ref()
            .map(bucket_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error(e, Resource::Bucket))
    }

    async fn get_bucket_by_id(&self, bucket_id: Uuid) -> RepositoryResult<Option<Bucket>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {BUCKET_COLUMNS}
            FROM buckets b
            LEFT JOIN bucket_usage u ON u.bucket_id = b.id
            WHERE b.id = $1
            "#
        ))
        .bind(bucket_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::Bucket))?;

        row.as_ref()
            .map(bucket_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error(e, Resource::Bucket))
    }

    async fn delete_bucket(&self, owner_id: Uuid, bucket_id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM buckets WHERE id = $1 AND owner_id = $2")
            .bind(bucket_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, Resource::Bucket))?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, Resource::Bucket))?;
        Ok(())
    }
}
