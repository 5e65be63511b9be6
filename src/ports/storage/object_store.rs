use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::{
    errors::StorageResult,
    models::{ByteStream, PresignMethod},
    value_objects::{ContainerName, ObjectName},
};

/// Port for the external object store
///
/// Objects are addressed by (container, name). Implementations must not
/// buffer whole payloads: uploads are consumed from the stream and
/// downloads handed back as a stream.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Stream `body` into the object and return the number of bytes stored
    ///
    /// `declared_size` is a hint (0 when unknown); the returned size is what
    /// was actually written.
    async fn put_object(
        &self,
        container: &ContainerName,
        name: &ObjectName,
        body: ByteStream,
        declared_size: u64,
        content_type: &str,
    ) -> StorageResult<u64>;

    /// Open a read stream over the object
    async fn get_object(&self, container: &ContainerName, name: &ObjectName)
        -> StorageResult<ByteStream>;

    /// Remove the object; removing a missing object succeeds
    async fn remove_object(&self, container: &ContainerName, name: &ObjectName)
        -> StorageResult<()>;

    async fn container_exists(&self, container: &ContainerName) -> StorageResult<bool>;

    async fn create_container(&self, container: &ContainerName) -> StorageResult<()>;

    /// Mint a time-limited URL granting `method` on the object
    async fn presign_url(
        &self,
        container: &ContainerName,
        name: &ObjectName,
        method: PresignMethod,
        ttl: Duration,
    ) -> StorageResult<String>;

    /// List objects whose names start with `prefix`
    ///
    /// Entries are yielded as the store pages them in; nothing is collected
    /// up front.
    async fn list_objects(
        &self,
        container: &ContainerName,
        prefix: &str,
    ) -> StorageResult<ObjectInfoStream>;
}

/// A boxed stream of listing entries
pub type ObjectInfoStream = BoxStream<'static, StorageResult<ObjectInfo>>;

/// Information about an object in storage
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub name: ObjectName,
    pub size: u64,
    pub last_modified: SystemTime,
    pub etag: Option<String>,
}
