use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    errors::RepositoryResult,
    models::{AuditRecord, PresignedRecord},
};

/// Append-only log of issued presigned URLs
#[async_trait]
pub trait PresignedRepository: Send + Sync + 'static {
    /// Persist both rows, or neither
    async fn save_issuance(
        &self,
        record: &PresignedRecord,
        audit: &AuditRecord,
    ) -> RepositoryResult<()>;

    async fn list_audit_for_file(&self, file_id: Uuid) -> RepositoryResult<Vec<AuditRecord>>;
}
