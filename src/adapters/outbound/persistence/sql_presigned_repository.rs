use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::error::map_sqlx_error;
use crate::{
    domain::{
        errors::{RepositoryError, RepositoryResult, Resource},
        models::{AuditRecord, PresignMethod, PresignedRecord},
    },
    ports::repositories::PresignedRepository,
};

/// PostgreSQL implementation of PresignedRepository
#[derive(Clone)]
pub struct SqlPresignedRepository {
    pool: PgPool,
}

impl SqlPresignedRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn audit_from_row(row: &PgRow) -> RepositoryResult<AuditRecord> {
    let decode = |e| map_sqlx_error(e, Resource::File);

    let method: String = row.try_get("method").map_err(decode)?;
    let method = PresignMethod::parse(&method).ok_or_else(|| RepositoryError::Corrupt {
        message: format!("unknown presign method '{}'", method),
    })?;

    Ok(AuditRecord {
        id: row.try_get("id").map_err(decode)?,
        actor_id: row.try_get("actor_id").map_err(decode)?,
        bucket_id: row.try_get("bucket_id").map_err(decode)?,
        file_id: row.try_get("file_id").map_err(decode)?,
        method,
        expires_at: row.try_get("expires_at").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

#[async_trait]
impl PresignedRepository for SqlPresignedRepository {
    async fn save_issuance(
        &self,
        record: &PresignedRecord,
        audit: &AuditRecord,
    ) -> RepositoryResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, Resource::File))?;

        sqlx::query(
            r#"
            INSERT INTO presigned_urls (id, bucket_id, file_id, object_name, method, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.bucket_id)
        .bind(record.file_id)
        .bind(&record.object_name)
        .bind(record.method.as_str())
        .bind(record.expires_at)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::File))?;

        sqlx::query(
            r#"
            INSERT INTO presigned_audit (id, actor_id, bucket_id, file_id, method, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(audit.id)
        .bind(audit.actor_id)
        .bind(audit.bucket_id)
        .bind(audit.file_id)
        .bind(audit.method.as_str())
        .bind(audit.expires_at)
        .bind(audit.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::File))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, Resource::File))
    }

    async fn list_audit_for_file(&self, file_id: Uuid) -> RepositoryResult<Vec<AuditRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, actor_id, bucket_id, file_id, method, expires_at, created_at
            FROM presigned_audit
            WHERE file_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::File))?;

        rows.iter().map(audit_from_row).collect()
    }
}
