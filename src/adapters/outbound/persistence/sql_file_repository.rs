use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::error::map_sqlx_error;
use crate::{
    domain::{
        errors::{RepositoryResult, Resource},
        models::{FileMetadata, FileObject, NewFileMetadata},
    },
    ports::repositories::FileRepository,
};

const FILE_COLUMNS: &str = r#"
    f.id, f.bucket_id, f.object_name, f.original_filename, f.size_bytes,
    f.content_type, f.checksum, f.created_at, f.updated_at
"#;

/// PostgreSQL implementation of FileRepository
#[derive(Clone)]
pub struct SqlFileRepository {
    pool: PgPool,
}

impl SqlFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn file_from_row(row: &PgRow) -> Result<FileMetadata, sqlx::Error> {
    Ok(FileMetadata {
        id: row.try_get("id")?,
        bucket_id: row.try_get("bucket_id")?,
        object_name: row.try_get("object_name")?,
        original_filename: row.try_get("original_filename")?,
        size_bytes: row.try_get("size_bytes")?,
        content_type: row.try_get("content_type")?,
        checksum: row.try_get("checksum")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn optional_file(row: Option<PgRow>) -> RepositoryResult<Option<FileMetadata>> {
    row.as_ref()
        .map(file_from_row)
        .transpose()
        .map_err(|e| map_sqlx_error(e, Resource::File))
}

#[async_trait]
impl FileRepository for SqlFileRepository {
    async fn create_file(&self, file: &NewFileMetadata) -> RepositoryResult<FileMetadata> {
        let row = sqlx::query(
            r#"
            INSERT INTO files (
                id, bucket_id, object_name, original_filename,
                size_bytes, content_type, checksum
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, bucket_id, object_name, original_filename, size_bytes,
                      content_type, checksum, created_at, updated_at
            "#,
        )
        .bind(file.id)
        .bind(file.bucket_id)
        .bind(file.object_name.as_str())
        .bind(file.original_filename.as_str())
        .bind(file.size_bytes)
        .bind(&file.content_type)
        .bind(file.checksum.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::Bucket))?;

        file_from_row(&row).map_err(|e| map_sqlx_error(e, Resource::File))
    }

    async fn list_files(&self, bucket_id: Uuid) -> RepositoryResult<Vec<FileMetadata>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {FILE_COLUMNS}
            FROM files f
            WHERE f.bucket_id = $1
            ORDER BY f.created_at DESC, f.id DESC
            "#
        ))
        .bind(bucket_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::File))?;

        rows.iter()
            .map(file_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error(e, Resource::File))
    }

    async fn get_file(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> RepositoryResult<Option<FileMetadata>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {FILE_COLUMNS}
            FROM files f
            JOIN buckets b ON b.id = f.bucket_id
            WHERE f.id = $1 AND f.bucket_id = $2 AND b.owner_id = $3
            "#
        ))
        .bind(file_id)
        .bind(bucket_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::File))?;

        optional_file(row)
    }

    async fn get_file_by_id(&self, file_id: Uuid) -> RepositoryResult<Option<FileMetadata>> {
        let row = sqlx::query(&format!("SELECT {FILE_COLUMNS} FROM files f WHERE f.id = $1"))
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, Resource::File))?;

        optional_file(row)
    }

    async fn delete_file(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> RepositoryResult<Option<FileMetadata>> {
        let row = sqlx::query(&format!(
            r#"
            DELETE FROM files f
            USING buckets b
            WHERE f.id = $1 AND f.bucket_id = $2
              AND b.id = f.bucket_id AND b.owner_id = $3
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(file_id)
        .bind(bucket_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::File))?;

        optional_file(row)
    }

    async fn list_objects_for_bucket(&self, bucket_id: Uuid) -> RepositoryResult<Vec<FileObject>> {
        let rows = sqlx::query(
            "SELECT id, object_name, size_bytes FROM files WHERE bucket_id = $1 ORDER BY created_at",
        )
        .bind(bucket_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, Resource::File))?;

        rows.iter()
            .map(|row| {
                Ok(FileObject {
                    file_id: row.try_get("id")?,
                    object_name: row.try_get("object_name")?,
                    size_bytes: row.try_get("size_bytes")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| map_sqlx_error(e, Resource::File))
    }
}
