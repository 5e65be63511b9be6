mod common;

use axum::http::StatusCode;
use axum_test::{
    TestServer,
    multipart::{MultipartForm, Part},
};
use drive_server::{
    AppBuilder, DriveSettings,
    adapters::inbound::http::{
        AppState, BucketDto, FileDto, ListBucketsResponseDto, ListFilesResponseDto,
        ListSnapshotsResponseDto, PresignedUrlDto, create_router,
    },
    create_in_memory_app,
};
use serde_json::json;
use uuid::Uuid;

use common::HELLO_WORLD_SHA256;

async fn server_with(settings: DriveSettings) -> TestServer {
    let services = AppBuilder::new()
        .with_settings(settings)
        .build()
        .await
        .unwrap();
    TestServer::new(create_router(AppState::from(&services))).unwrap()
}

async fn server() -> TestServer {
    let services = create_in_memory_app().await.unwrap();
    TestServer::new(create_router(AppState::from(&services))).unwrap()
}

async fn create_bucket(server: &TestServer, user: Uuid, name: &str) -> BucketDto {
    let response = server
        .post("/v1/buckets")
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "name": name }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

fn text_form(filename: &str, data: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data.to_vec())
            .file_name(filename)
            .mime_type("text/plain"),
    )
}

async fn upload(server: &TestServer, user: Uuid, bucket: Uuid, filename: &str, data: &[u8]) -> FileDto {
    let response = server
        .post(&format!("/v1/buckets/{}/files", bucket))
        .add_header("x-user-id", user.to_string())
        .multipart(text_form(filename, data))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_bucket_lifecycle() {
    let server = server().await;
    let user = Uuid::new_v4();

    let bucket = create_bucket(&server, user, "photos").await;
    assert_eq!(bucket.name, "photos");
    assert_eq!(bucket.file_count, 0);

    let duplicate = server
        .post("/v1/buckets")
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "name": "photos" }))
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);

    let invalid = server
        .post("/v1/buckets")
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "name": "" }))
        .await;
    invalid.assert_status(StatusCode::BAD_REQUEST);

    let listed: ListBucketsResponseDto = server
        .get("/v1/buckets")
        .add_header("x-user-id", user.to_string())
        .await
        .json();
    assert_eq!(listed.total_count, 1);

    server
        .delete(&format!("/v1/buckets/{}", bucket.id))
        .add_header("x-user-id", user.to_string())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/v1/buckets/{}", bucket.id))
        .add_header("x-user-id", user.to_string())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_and_download() {
    let server = server().await;
    let user = Uuid::new_v4();
    let bucket = create_bucket(&server, user, "docs").await;

    let file = upload(&server, user, bucket.id, "hello.txt", b"hello world").await;
    assert_eq!(file.original_filename, "hello.txt");
    assert_eq!(file.size_bytes, 11);
    assert_eq!(file.content_type, "text/plain");
    assert_eq!(file.checksum, HELLO_WORLD_SHA256);

    let response = server
        .get(&format!("/v1/buckets/{}/files/{}/download", bucket.id, file.id))
        .add_header("x-user-id", user.to_string())
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"hello world");
    assert_eq!(response.header("x-checksum-sha256"), HELLO_WORLD_SHA256);
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"hello.txt\""
    );

    let files: ListFilesResponseDto = server
        .get(&format!("/v1/buckets/{}/files", bucket.id))
        .add_header("x-user-id", user.to_string())
        .await
        .json();
    assert_eq!(files.total_count, 1);

    let refreshed: BucketDto = server
        .get(&format!("/v1/buckets/{}", bucket.id))
        .add_header("x-user-id", user.to_string())
        .await
        .json();
    assert_eq!((refreshed.total_bytes, refreshed.file_count), (11, 1));

    server
        .delete(&format!("/v1/buckets/{}/files/{}", bucket.id, file.id))
        .add_header("x-user-id", user.to_string())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/v1/buckets/{}/files/{}/download", bucket.id, file.id))
        .add_header("x-user-id", user.to_string())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let server = server().await;
    let user = Uuid::new_v4();
    let bucket = create_bucket(&server, user, "docs").await;

    let form = MultipartForm::new().add_text("note", "no payload here");
    server
        .post(&format!("/v1/buckets/{}/files", bucket.id))
        .add_header("x-user-id", user.to_string())
        .multipart(form)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_over_limit() {
    let server = server_with(DriveSettings {
        max_file_size: 8,
        ..DriveSettings::default()
    })
    .await;
    let user = Uuid::new_v4();
    let bucket = create_bucket(&server, user, "small").await;

    // declared up front
    let response = server
        .post(&format!("/v1/buckets/{}/files", bucket.id))
        .add_header("x-user-id", user.to_string())
        .add_header("x-file-size", "64")
        .multipart(text_form("big.txt", &[b'x'; 64]))
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["details"]["limit"], 8);

    // discovered while streaming
    server
        .post(&format!("/v1/buckets/{}/files", bucket.id))
        .add_header("x-user-id", user.to_string())
        .multipart(text_form("big.txt", &[b'x'; 64]))
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    let files: ListFilesResponseDto = server
        .get(&format!("/v1/buckets/{}/files", bucket.id))
        .add_header("x-user-id", user.to_string())
        .await
        .json();
    assert_eq!(files.total_count, 0);
}

#[tokio::test]
async fn test_foreign_user_sees_not_found() {
    let server = server().await;
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let bucket = create_bucket(&server, owner, "private").await;
    let file = upload(&server, owner, bucket.id, "secret.txt", b"top secret").await;

    for path in [
        format!("/v1/buckets/{}", bucket.id),
        format!("/v1/buckets/{}/files", bucket.id),
        format!("/v1/buckets/{}/files/{}/download", bucket.id, file.id),
    ] {
        server
            .get(&path)
            .add_header("x-user-id", stranger.to_string())
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    server
        .delete(&format!("/v1/buckets/{}/files/{}", bucket.id, file.id))
        .add_header("x-user-id", stranger.to_string())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .post(&format!(
            "/v1/buckets/{}/files/{}/presigned-url",
            bucket.id, file.id
        ))
        .add_header("x-user-id", stranger.to_string())
        .json(&json!({}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let listed: ListBucketsResponseDto = server
        .get("/v1/buckets")
        .add_header("x-user-id", stranger.to_string())
        .await
        .json();
    assert_eq!(listed.total_count, 0);
}

#[tokio::test]
async fn test_presigned_urls() {
    let server = server().await;
    let user = Uuid::new_v4();
    let bucket = create_bucket(&server, user, "shared").await;
    let file = upload(&server, user, bucket.id, "a.txt", b"abc").await;
    let path = format!("/v1/buckets/{}/files/{}/presigned-url", bucket.id, file.id);

    let response = server
        .post(&path)
        .add_header("x-user-id", user.to_string())
        .json(&json!({}))
        .await;
    response.assert_status_ok();
    let issued: PresignedUrlDto = response.json();
    assert_eq!(issued.method, "GET");
    assert!(!issued.url.is_empty());

    let put: PresignedUrlDto = server
        .post(&path)
        .add_header("x-user-id", user.to_string())
        .json(&json!({ "method": "put", "ttl_seconds": 60 }))
        .await
        .json();
    assert_eq!(put.method, "PUT");

    for body in [
        json!({ "method": "DELETE" }),
        json!({ "ttl_seconds": 0 }),
        json!({ "ttl_seconds": 30 * 24 * 3600 }),
    ] {
        server
            .post(&path)
            .add_header("x-user-id", user.to_string())
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_usage_snapshots() {
    let server = server().await;
    let user = Uuid::new_v4();
    let bucket = create_bucket(&server, user, "docs").await;
    upload(&server, user, bucket.id, "a.txt", b"hello").await;
    upload(&server, user, bucket.id, "b.txt", b"world!").await;

    let history: ListSnapshotsResponseDto = server
        .get("/v1/usage/snapshots")
        .add_header("x-user-id", user.to_string())
        .await
        .json();
    assert_eq!(history.snapshots.len(), 2);
    assert_eq!(history.snapshots[0].total_bytes, 11);
    assert_eq!(history.snapshots[0].file_count, 2);

    let limited: ListSnapshotsResponseDto = server
        .get("/v1/usage/snapshots")
        .add_query_param("limit", 1)
        .add_header("x-user-id", user.to_string())
        .await
        .json();
    assert_eq!(limited.snapshots.len(), 1);
}

#[tokio::test]
async fn test_malformed_identity_rejected() {
    let server = server().await;
    server
        .get("/v1/buckets")
        .add_header("x-user-id", "not-a-uuid")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
