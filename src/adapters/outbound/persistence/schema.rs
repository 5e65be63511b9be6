use sqlx::PgPool;

/// Tables, constraints and indexes of the metadata store
///
/// Idempotent; safe to run on every start.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS buckets (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT buckets_owner_name_key UNIQUE (owner_id, name)
);

CREATE TABLE IF NOT EXISTS files (
    id UUID PRIMARY KEY,
    bucket_id UUID NOT NULL REFERENCES buckets(id) ON DELETE CASCADE,
    object_name TEXT NOT NULL,
    original_filename TEXT NOT NULL,
    size_bytes BIGINT NOT NULL CHECK (size_bytes >= 0),
    content_type TEXT NOT NULL,
    checksum TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT files_bucket_object_key UNIQUE (bucket_id, object_name)
);

CREATE INDEX IF NOT EXISTS idx_files_bucket_created ON files(bucket_id, created_at DESC);

CREATE TABLE IF NOT EXISTS bucket_usage (
    bucket_id UUID PRIMARY KEY REFERENCES buckets(id) ON DELETE CASCADE,
    total_bytes BIGINT NOT NULL DEFAULT 0 CHECK (total_bytes >= 0),
    file_count BIGINT NOT NULL DEFAULT 0 CHECK (file_count >= 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS usage_snapshots (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL,
    total_bytes BIGINT NOT NULL,
    file_count BIGINT NOT NULL,
    captured_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_usage_snapshots_owner ON usage_snapshots(owner_id, captured_at DESC);

CREATE TABLE IF NOT EXISTS presigned_urls (
    id UUID PRIMARY KEY,
    bucket_id UUID NOT NULL,
    file_id UUID NOT NULL,
    object_name TEXT NOT NULL,
    method TEXT NOT NULL CHECK (method IN ('GET', 'PUT')),
    expires_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS presigned_audit (
    id UUID PRIMARY KEY,
    actor_id UUID NOT NULL,
    bucket_id UUID NOT NULL,
    file_id UUID NOT NULL,
    method TEXT NOT NULL CHECK (method IN ('GET', 'PUT')),
    expires_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_presigned_audit_file ON presigned_audit(file_id, created_at DESC);
"#;

/// Initialize database tables
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
