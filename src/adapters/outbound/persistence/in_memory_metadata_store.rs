use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    domain::{
        errors::{RepositoryError, RepositoryResult, Resource},
        models::{
            AuditRecord, Bucket, FileMetadata, FileObject, NewBucket, NewFileMetadata,
            PresignedRecord, UsageDelta, UsageSnapshot, UsageStats,
        },
    },
    ports::repositories::{
        BucketRepository, FileRepository, PresignedRepository, UsageRepository,
    },
};

/// In-memory metadata store for testing and development
///
/// Implements every metadata repository over one set of tables so that the
/// relational guarantees hold across them: unique (owner, name) buckets,
/// unique object names per bucket, and bucket deletion cascading to files
/// and the usage row.
#[derive(Clone, Default)]
pub struct InMemoryMetadataStore {
    data: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    buckets: HashMap<Uuid, BucketRow>,
    files: HashMap<Uuid, FileMetadata>,
    usage: HashMap<Uuid, UsageStats>,
    snapshots: Vec<UsageSnapshot>,
    presigned: Vec<PresignedRecord>,
    audit: Vec<AuditRecord>,
}

#[derive(Clone)]
struct BucketRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: Option<String>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl Tables {
    fn bucket(&self, row: &BucketRow) -> Bucket {
        Bucket {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name.clone(),
            description: row.description.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            usage: self.usage.get(&row.id).copied().unwrap_or_default(),
        }
    }

    fn owns(&self, owner_id: Uuid, bucket_id: Uuid) -> bool {
        self.buckets
            .get(&bucket_id)
            .is_some_and(|b| b.owner_id == owner_id)
    }
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of live file sizes and count per bucket, computed by full scan
    pub async fn scan_usage(&self, bucket_id: Uuid) -> UsageStats {
        let data = self.data.read().await;
        data.files
            .values()
            .filter(|f| f.bucket_id == bucket_id)
            .map(|f| UsageStats {
                total_bytes: f.size_bytes,
                file_count: 1,
            })
            .sum()
    }

    /// Issuance rows recorded so far, oldest first
    pub async fn presigned_records(&self) -> Vec<PresignedRecord> {
        self.data.read().await.presigned.clone()
    }
}

#[async_trait]
impl BucketRepository for InMemoryMetadataStore {
    async fn create_bucket(&self, bucket: &NewBucket) -> RepositoryResult<Bucket> {
        let mut data = self.data.write().await;

        let duplicate = data
            .buckets
            .values()
            .any(|b| b.owner_id == bucket.owner_id && b.name == bucket.name.as_str());
        if duplicate || data.buckets.contains_key(&bucket.id) {
            return Err(RepositoryError::Conflict {
                constraint: "buckets_owner_name_key".to_string(),
            });
        }

        let now = Utc::now();
        let row = BucketRow {
            id: bucket.id,
            owner_id: bucket.owner_id,
            name: bucket.name.as_str().to_string(),
            description: bucket.description.clone(),
            created_at: now,
            updated_at: now,
        };
        data.buckets.insert(row.id, row.clone());

        Ok(data.bucket(&row))
    }

    async fn list_buckets(&self, owner_id: Uuid) -> RepositoryResult<Vec<Bucket>> {
        let data = self.data.read().await;
        let mut rows: Vec<&BucketRow> = data
            .buckets
            .values()
            .filter(|b| b.owner_id == owner_id)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));

        Ok(rows.into_iter().map(|row| data.bucket(row)).collect())
    }

    async fn get_bucket(&self, owner_id: Uuid, bucket_id: Uuid) -> RepositoryResult<Option<Bucket>> {
        let data = self.data.read().await;
        Ok(data
            .buckets
            .get(&bucket_id)
            .filter(|b| b.owner_id == owner_id)
            .map(|row| data.bucket(row)))
    }

    async fn get_bucket_by_id(&self, bucket_id: Uuid) -> RepositoryResult<Option<Bucket>> {
        let data = self.data.read().await;
        Ok(data.buckets.get(&bucket_id).map(|row| data.bucket(row)))
    }

    async fn delete_bucket(&self, owner_id: Uuid, bucket_id: Uuid) -> RepositoryResult<bool> {
        let mut data = self.data.write().await;
        if !data.owns(owner_id, bucket_id) {
            return Ok(false);
        }

        data.buckets.remove(&bucket_id);
        data.files.retain(|_, f| f.bucket_id != bucket_id);
        data.usage.remove(&bucket_id);
        Ok(true)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[async_trait]
impl FileRepository for InMemoryMetadataStore {
    async fn create_file(&self, file: &NewFileMetadata) -> RepositoryResult<FileMetadata> {
        let mut data = self.data.write().await;

        if !data.buckets.contains_key(&file.bucket_id) {
            return Err(RepositoryError::not_found(Resource::Bucket));
        }
        let duplicate = data.files.values().any(|f| {
            f.bucket_id == file.bucket_id && f.object_name == file.object_name.as_str()
        });
        if duplicate || data.files.contains_key(&file.id) {
            return Err(RepositoryError::Conflict {
                constraint: "files_bucket_object_key".to_string(),
            });
        }

        let now = Utc::now();
        let stored = FileMetadata {
            id: file.id,
            bucket_id: file.bucket_id,
            object_name: file.object_name.to_string(),
            original_filename: file.original_filename.to_string(),
            size_bytes: file.size_bytes,
            content_type: file.content_type.clone(),
            checksum: file.checksum.to_string(),
            created_at: now,
            updated_at: now,
        };
        data.files.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_files(&self, bucket_id: Uuid) -> RepositoryResult<Vec<FileMetadata>> {
        let data = self.data.read().await;
        let mut files: Vec<FileMetadata> = data
            .files
            .values()
            .filter(|f| f.bucket_id == bucket_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(files)
    }

    async fn get_file(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> RepositoryResult<Option<FileMetadata>> {
        let data = self.data.read().await;
        if !data.owns(owner_id, bucket_id) {
            return Ok(None);
        }
        Ok(data
            .files
            .get(&file_id)
            .filter(|f| f.bucket_id == bucket_id)
            .cloned())
    }

    async fn get_file_by_id(&self, file_id: Uuid) -> RepositoryResult<Option<FileMetadata>> {
        Ok(self.data.read().await.files.get(&file_id).cloned())
    }

    async fn delete_file(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> RepositoryResult<Option<FileMetadata>> {
        let mut data = self.data.write().await;
        if !data.owns(owner_id, bucket_id) {
            return Ok(None);
        }
        match data.files.get(&file_id) {
            Some(f) if f.bucket_id == bucket_id => Ok(data.files.remove(&file_id)),
            _ => Ok(None),
        }
    }

    async fn list_objects_for_bucket(&self, bucket_id: Uuid) -> RepositoryResult<Vec<FileObject>> {
        let data = self.data.read().await;
        Ok(data
            .files
            .values()
            .filter(|f| f.bucket_id == bucket_id)
            .map(|f| FileObject {
                file_id: f.id,
                object_name: f.object_name.clone(),
                size_bytes: f.size_bytes,
            })
            .collect())
    }
}

#[async_trait]
impl UsageRepository for InMemoryMetadataStore {
    async fn ensure_usage_row(&self, bucket_id: Uuid) -> RepositoryResult<()> {
        let mut data = self.data.write().await;
        if !data.buckets.contains_key(&bucket_id) {
            return Err(RepositoryError::not_found(Resource::Bucket));
        }
        data.usage.entry(bucket_id).or_default();
        Ok(())
    }

    async fn apply_delta(&self, bucket_id: Uuid, delta: UsageDelta) -> RepositoryResult<UsageStats> {
        let mut data = self.data.write().await;
        if !data.buckets.contains_key(&bucket_id) {
            return Err(RepositoryError::not_found(Resource::Bucket));
        }
        let counters = data.usage.entry(bucket_id).or_default();
        *counters = counters.apply(delta);
        Ok(*counters)
    }

    async fn get_usage(&self, bucket_id: Uuid) -> RepositoryResult<UsageStats> {
        Ok(self
            .data
            .read()
            .await
            .usage
            .get(&bucket_id)
            .copied()
            .unwrap_or_default())
    }

    async fn record_snapshot(&self, owner_id: Uuid) -> RepositoryResult<UsageSnapshot> {
        let mut data = self.data.write().await;
        let totals: UsageStats = data
            .buckets
            .values()
            .filter(|b| b.owner_id == owner_id)
            .filter_map(|b| data.usage.get(&b.id).copied())
            .sum();

        let snapshot = UsageSnapshot::capture(owner_id, totals);
        data.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn list_snapshots(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> RepositoryResult<Vec<UsageSnapshot>> {
        let data = self.data.read().await;
        Ok(data
            .snapshots
            .iter()
            .rev()
            .filter(|s| s.owner_id == owner_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PresignedRepository for InMemoryMetadataStore {
    async fn save_issuance(
        &self,
        record: &PresignedRecord,
        audit: &AuditRecord,
    ) -> RepositoryResult<()> {
        let mut data = self.data.write().await;
        data.presigned.push(record.clone());
        data.audit.push(audit.clone());
        Ok(())
    }

    async fn list_audit_for_file(&self, file_id: Uuid) -> RepositoryResult<Vec<AuditRecord>> {
        let data = self.data.read().await;
        Ok(data
            .audit
            .iter()
            .rev()
            .filter(|a| a.file_id == file_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PresignMethod;
    use crate::domain::value_objects::{BucketName, Checksum, FileName, ObjectName};

    async fn bucket(store: &InMemoryMetadataStore, owner: Uuid, name: &str) -> Bucket {
        let new = NewBucket::new(owner, BucketName::new(name).unwrap(), None);
        store.create_bucket(&new).await.unwrap()
    }

    fn file(bucket_id: Uuid, size: i64) -> NewFileMetadata {
        let id = Uuid::new_v4();
        NewFileMetadata {
            id,
            bucket_id,
            object_name: ObjectName::for_file(bucket_id, id),
            original_filename: FileName::sanitize(Some("a.txt")),
            size_bytes: size,
            content_type: "text/plain".to_string(),
            checksum: Checksum::of(b"a"),
        }
    }

    #[tokio::test]
    async fn test_bucket_names_unique_per_owner() {
        let store = InMemoryMetadataStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        bucket(&store, alice, "docs").await;
        let dup = NewBucket::new(alice, BucketName::new("docs").unwrap(), None);
        assert!(store.create_bucket(&dup).await.unwrap_err().is_conflict());

        bucket(&store, bob, "docs").await;
        assert_eq!(store.list_buckets(bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ownership_filter_hides_foreign_rows() {
        let store = InMemoryMetadataStore::new();
        let alice = Uuid::new_v4();
        let mallory = Uuid::new_v4();
        let docs = bucket(&store, alice, "docs").await;
        let stored = store.create_file(&file(docs.id, 3)).await.unwrap();

        assert!(store.get_bucket(mallory, docs.id).await.unwrap().is_none());
        assert!(store
            .get_file(mallory, docs.id, stored.id)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .delete_file(mallory, docs.id, stored.id)
            .await
            .unwrap()
            .is_none());
        assert!(store.get_file_by_id(stored.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_bucket_cascades() {
        let store = InMemoryMetadataStore::new();
        let owner = Uuid::new_v4();
        let docs = bucket(&store, owner, "docs").await;
        let stored = store.create_file(&file(docs.id, 5)).await.unwrap();
        store
            .apply_delta(docs.id, UsageDelta::for_upload(5))
            .await
            .unwrap();

        assert!(store.delete_bucket(owner, docs.id).await.unwrap());
        assert!(store.get_file_by_id(stored.id).await.unwrap().is_none());
        assert_eq!(store.get_usage(docs.id).await.unwrap(), UsageStats::default());
        assert!(!store.delete_bucket(owner, docs.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_usage_delta_clamps_and_snapshot_sums() {
        let store = InMemoryMetadataStore::new();
        let owner = Uuid::new_v4();
        let a = bucket(&store, owner, "a").await;
        let b = bucket(&store, owner, "b").await;

        store.apply_delta(a.id, UsageDelta::for_upload(10)).await.unwrap();
        store.apply_delta(b.id, UsageDelta::for_upload(4)).await.unwrap();
        let clamped = store
            .apply_delta(b.id, UsageDelta::new(-100, -5))
            .await
            .unwrap();
        assert_eq!(clamped, UsageStats::default());

        let snapshot = store.record_snapshot(owner).await.unwrap();
        assert_eq!(snapshot.total_bytes, 10);
        assert_eq!(snapshot.file_count, 1);

        let history = store.list_snapshots(owner, 10).await.unwrap();
        assert_eq!(history, vec![snapshot]);
    }

    #[tokio::test]
    async fn test_files_listed_newest_first() {
        let store = InMemoryMetadataStore::new();
        let owner = Uuid::new_v4();
        let docs = bucket(&store, owner, "docs").await;

        let first = store.create_file(&file(docs.id, 1)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = store.create_file(&file(docs.id, 2)).await.unwrap();

        let listed = store.list_files(docs.id).await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_issuance_and_audit_rows_kept_together() {
        let store = InMemoryMetadataStore::new();
        let actor = Uuid::new_v4();
        let (bucket_id, file_id) = (Uuid::new_v4(), Uuid::new_v4());
        let now = chrono::Utc::now();
        let expires_at = now + chrono::Duration::minutes(15);

        for method in [PresignMethod::Get, PresignMethod::Put] {
            let record = PresignedRecord {
                id: Uuid::new_v4(),
                bucket_id,
                file_id,
                object_name: ObjectName::for_file(bucket_id, file_id).to_string(),
                method,
                expires_at,
                created_at: now,
            };
            let audit = AuditRecord {
                id: Uuid::new_v4(),
                actor_id: actor,
                bucket_id,
                file_id,
                method,
                expires_at,
                created_at: now,
            };
            store.save_issuance(&record, &audit).await.unwrap();
        }

        let records = store.presigned_records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].method, PresignMethod::Get);

        let audit = store.list_audit_for_file(file_id).await.unwrap();
        assert_eq!(audit.len(), 2);
        assert_eq!(audit[0].method, PresignMethod::Put);
        assert!(store.list_audit_for_file(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
