#![allow(dead_code)]

use bytes::Bytes;
use drive_server::{
    AppServices, ByteStream, FileMetadata, UploadRequest,
    domain::models::byte_stream_from,
};
use futures::{StreamExt, TryStreamExt};
use uuid::Uuid;

pub const HELLO_WORLD_SHA256: &str =
    "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

/// Stream that yields each chunk separately, the way a socket would
pub fn chunked(chunks: Vec<&'static [u8]>) -> ByteStream {
    async_stream::stream! {
        for chunk in chunks {
            yield Ok::<_, std::io::Error>(Bytes::from_static(chunk));
        }
    }
    .boxed()
}

pub async fn read_all(stream: ByteStream) -> Vec<u8> {
    let chunks: Vec<Bytes> = stream.try_collect().await.expect("stream failed");
    chunks.concat()
}

pub async fn upload(
    app: &AppServices,
    owner_id: Uuid,
    bucket_id: Uuid,
    filename: &str,
    data: &'static [u8],
) -> FileMetadata {
    app.file_service
        .upload(
            UploadRequest::builder()
                .owner_id(owner_id)
                .bucket_id(bucket_id)
                .body(byte_stream_from(data))
                .declared_size(data.len() as u64)
                .filename(filename.to_string())
                .build(),
        )
        .await
        .expect("upload failed")
}

/// Names of stored objects under a bucket's prefix
pub async fn objects_in_bucket(app: &AppServices, bucket_id: Uuid) -> Vec<String> {
    let prefix = format!("{}/", bucket_id);
    app.object_store
        .list_objects(&app.settings.object_container, &prefix)
        .await
        .expect("listing failed")
        .map_ok(|o| o.name.to_string())
        .try_collect()
        .await
        .expect("listing failed")
}
