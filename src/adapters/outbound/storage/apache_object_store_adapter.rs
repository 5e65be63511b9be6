use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::{
    memory::InMemory, path::Path as ObjectPath, signer::Signer, Attribute, Attributes,
    ObjectStore as ApacheObjectStore, PutMultipartOpts, PutOptions, PutPayload, WriteMultipart,
};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::{
    error::{http_error, into_io_error, object_error, payload_error},
    s3::{create_s3_store, S3Config},
};
use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{ByteStream, PresignMethod},
        value_objects::{ContainerName, ObjectName},
    },
    ports::storage::{ObjectInfo, ObjectInfoStream, ObjectStore},
};

/// Payloads up to this size are sent with a single PUT; larger ones switch
/// to a multipart upload. Also the S3 minimum part size.
pub const SINGLE_PUT_THRESHOLD: usize = 5 * 1024 * 1024;

/// Concurrent part uploads per multipart write
const MAX_CONCURRENT_PARTS: usize = 4;

/// Which object_store implementation backs each container
#[derive(Debug, Clone)]
pub enum StoreProvider {
    /// Process-local store; containers must be created explicitly
    InMemory,
    /// AWS S3 or an S3-compatible server such as MinIO
    S3(S3Config),
}

#[derive(Clone)]
struct ContainerHandle {
    store: Arc<dyn ApacheObjectStore>,
    signer: Option<Arc<dyn Signer>>,
}

/// Adapter that implements our ObjectStore port on top of Apache object_store
///
/// One object_store client is kept per container and shared by every call.
pub struct ApacheObjectStoreAdapter {
    provider: StoreProvider,
    containers: RwLock<HashMap<ContainerName, ContainerHandle>>,
    http: reqwest::Client,
}

impl ApacheObjectStoreAdapter {
    pub fn new(provider: StoreProvider) -> Self {
        Self {
            provider,
            containers: RwLock::new(HashMap::new()),
            http: reqwest::Client::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(StoreProvider::InMemory)
    }

    async fn handle(&self, container: &ContainerName) -> StorageResult<ContainerHandle> {
        if let Some(handle) = self.containers.read().await.get(container) {
            return Ok(handle.clone());
        }

        match &self.provider {
            StoreProvider::InMemory => Err(StorageError::ContainerNotFound {
                container: container.to_string(),
            }),
            StoreProvider::S3(config) => {
                let client = Arc::new(create_s3_store(config, container)?);
                let handle = ContainerHandle {
                    store: client.clone(),
                    signer: Some(client as Arc<dyn Signer>),
                };
                let mut containers = self.containers.write().await;
                Ok(containers
                    .entry(container.clone())
                    .or_insert(handle)
                    .clone())
            }
        }
    }

    /// Signed URL addressing the container itself rather than an object
    async fn container_url(
        &self,
        container: &ContainerName,
        method: http::Method,
    ) -> StorageResult<String> {
        let handle = self.handle(container).await?;
        let signer = handle.signer.ok_or_else(|| StorageError::UnsupportedOperation {
            operation: "container request".to_string(),
            reason: "store has no signer".to_string(),
        })?;
        let url = signer
            .signed_url(method, &ObjectPath::default(), Duration::from_secs(60))
            .await?;
        Ok(url.to_string())
    }

    async fn put_single(
        store: &dyn ApacheObjectStore,
        path: &ObjectPath,
        chunks: Vec<Bytes>,
        attributes: Attributes,
    ) -> Result<(), object_store::Error> {
        let payload: PutPayload = chunks.into_iter().collect();
        store
            .put_opts(
                path,
                payload,
                PutOptions {
                    attributes,
                    ..Default::default()
                },
            )
            .await
            .map(|_| ())
    }
}

fn content_attributes(content_type: &str) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    attributes
}

/// Stream the rest of `body` into `writer` and complete the upload
///
/// Returns the bytes taken from `body`. On a part or payload failure the
/// upload is aborted before the error is returned.
async fn drain_multipart(
    mut writer: WriteMultipart,
    body: &mut ByteStream,
    container: &ContainerName,
    name: &ObjectName,
) -> StorageResult<u64> {
    let mut written: u64 = 0;

    loop {
        if let Err(e) = writer.wait_for_capacity(MAX_CONCURRENT_PARTS).await {
            abort_multipart(writer).await;
            return Err(object_error(e, container, name));
        }

        match body.next().await {
            Some(Ok(chunk)) => {
                written += chunk.len() as u64;
                writer.write(&chunk);
            }
            Some(Err(e)) => {
                abort_multipart(writer).await;
                return Err(payload_error(e));
            }
            None => break,
        }
    }

    writer
        .finish()
        .await
        .map_err(|e| object_error(e, container, name))?;
    Ok(written)
}

async fn abort_multipart(writer: WriteMultipart) {
    if let Err(e) = writer.abort().await {
        warn!(error = %e, "failed to abort multipart upload");
    }
}

#[async_trait]
impl ObjectStore for ApacheObjectStoreAdapter {
    #[instrument(skip_all, fields(container = %container, object = %name))]
    async fn put_object(
        &self,
        container: &ContainerName,
        name: &ObjectName,
        mut body: ByteStream,
        declared_size: u64,
        content_type: &str,
    ) -> StorageResult<u64> {
        let handle = self.handle(container).await?;
        let path = ObjectPath::from(name.as_str());

        // Buffer up to one part; small payloads never start a multipart upload.
        let mut buffered: Vec<Bytes> = Vec::new();
        let mut buffered_len = 0usize;
        let mut total: u64 = 0;

        while buffered_len <= SINGLE_PUT_THRESHOLD {
            match body.next().await {
                Some(Ok(chunk)) => {
                    buffered_len += chunk.len();
                    total += chunk.len() as u64;
                    buffered.push(chunk);
                }
                Some(Err(e)) => return Err(payload_error(e)),
                None => {
                    Self::put_single(
                        handle.store.as_ref(),
                        &path,
                        buffered,
                        content_attributes(content_type),
                    )
                    .await
                    .map_err(|e| object_error(e, container, name))?;
                    debug!(bytes = total, declared_size, "stored object with single put");
                    return Ok(total);
                }
            }
        }

        let upload = handle
            .store
            .put_multipart_opts(
                &path,
                PutMultipartOpts {
                    attributes: content_attributes(content_type),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| object_error(e, container, name))?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, SINGLE_PUT_THRESHOLD);

        for chunk in buffered.drain(..) {
            writer.write(&chunk);
        }

        total += drain_multipart(writer, &mut body, container, name).await?;
        debug!(bytes = total, declared_size, "stored object with multipart upload");
        Ok(total)
    }

    #[instrument(skip_all, fields(container = %container, object = %name))]
    async fn get_object(
        &self,
        container: &ContainerName,
        name: &ObjectName,
    ) -> StorageResult<ByteStream> {
        let handle = self.handle(container).await?;
        let path = ObjectPath::from(name.as_str());

        let result = handle
            .store
            .get(&path)
            .await
            .map_err(|e| object_error(e, container, name))?;

        Ok(result.into_stream().map_err(into_io_error).boxed())
    }

    #[instrument(skip_all, fields(container = %container, object = %name))]
    async fn remove_object(&self, container: &ContainerName, name: &ObjectName) -> StorageResult<()> {
        let handle = self.handle(container).await?;
        let path = ObjectPath::from(name.as_str());

        match handle.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(object_error(e, container, name)),
        }
    }

    async fn container_exists(&self, container: &ContainerName) -> StorageResult<bool> {
        match &self.provider {
            StoreProvider::InMemory => Ok(self.containers.read().await.contains_key(container)),
            StoreProvider::S3(_) => {
                let url = self.container_url(container, http::Method::HEAD).await?;
                let response = self
                    .http
                    .head(url)
                    .send()
                    .await
                    .map_err(|e| http_error("HeadBucket", e))?;

                match response.status().as_u16() {
                    200..=299 => Ok(true),
                    404 => Ok(false),
                    status => Err(StorageError::InfrastructureError {
                        message: format!("HeadBucket returned {}", status),
                        source: None,
                    }),
                }
            }
        }
    }

    #[instrument(skip_all, fields(container = %container))]
    async fn create_container(&self, container: &ContainerName) -> StorageResult<()> {
        match &self.provider {
            StoreProvider::InMemory => {
                self.containers
                    .write()
                    .await
                    .entry(container.clone())
                    .or_insert_with(|| ContainerHandle {
                        store: Arc::new(InMemory::new()),
                        signer: None,
                    });
                Ok(())
            }
            StoreProvider::S3(config) => {
                let url = self.container_url(container, http::Method::PUT).await?;
                let mut request = self.http.put(url);
                if config.region != "us-east-1" {
                    request = request.body(format!(
                        "<CreateBucketConfiguration><LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>",
                        config.region
                    ));
                }
                let response = request
                    .send()
                    .await
                    .map_err(|e| http_error("CreateBucket", e))?;

                let status = response.status();
                if status.is_success() || status.as_u16() == 409 {
                    // 409: already exists and owned by us
                    Ok(())
                } else {
                    let body = response.text().await.unwrap_or_default();
                    Err(StorageError::InfrastructureError {
                        message: format!("CreateBucket returned {}", status),
                        source: Some(body),
                    })
                }
            }
        }
    }

    #[instrument(skip_all, fields(container = %container, object = %name))]
    async fn presign_url(
        &self,
        container: &ContainerName,
        name: &ObjectName,
        method: PresignMethod,
        ttl: Duration,
    ) -> StorageResult<String> {
        let handle = self.handle(container).await?;
        let path = ObjectPath::from(name.as_str());

        match handle.signer {
            Some(signer) => {
                let url = signer
                    .signed_url(method.into(), &path, ttl)
                    .await
                    .map_err(|e| object_error(e, container, name))?;
                Ok(url.to_string())
            }
            // Only reachable with the in-memory provider used for tests and local runs
            None => {
                let expires = chrono::Utc::now().timestamp() + ttl.as_secs() as i64;
                Ok(format!(
                    "memory://{}/{}?X-Drive-Method={}&X-Drive-Expires={}",
                    container, name, method, expires
                ))
            }
        }
    }

    async fn list_objects(
        &self,
        container: &ContainerName,
        prefix: &str,
    ) -> StorageResult<ObjectInfoStream> {
        let handle = self.handle(container).await?;
        let prefix_path = (!prefix.is_empty()).then(|| ObjectPath::from(prefix));

        let listing = handle
            .store
            .list(prefix_path.as_ref())
            .map(|result| -> StorageResult<ObjectInfo> {
                let meta = result?;
                let name = ObjectName::new(meta.location.to_string()).map_err(|e| {
                    StorageError::ValidationError {
                        message: format!("Invalid object name from store: {}", e),
                    }
                })?;

                Ok(ObjectInfo {
                    name,
                    size: meta.size,
                    last_modified: meta.last_modified.into(),
                    etag: meta.e_tag,
                })
            })
            .boxed();

        Ok(listing)
    }
}
