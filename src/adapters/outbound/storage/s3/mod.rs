//! S3-compatible backends (AWS and MinIO) built with the object_store crate

use object_store::aws::{AmazonS3, AmazonS3Builder};

use crate::domain::{errors::StorageError, value_objects::ContainerName};

/// Connection settings shared by every container of an S3-compatible endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Custom endpoint, e.g. a MinIO server
    pub endpoint: Option<String>,
    /// Permit plain HTTP endpoints
    pub allow_http: bool,
}

impl S3Config {
    pub fn aws(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            access_key: None,
            secret_key: None,
            endpoint: None,
            allow_http: false,
        }
    }

    /// Path-style configuration for a MinIO server
    pub fn minio(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        use_ssl: bool,
    ) -> Self {
        let endpoint = endpoint.into();
        let endpoint = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint
        } else if use_ssl {
            format!("https://{}", endpoint)
        } else {
            format!("http://{}", endpoint)
        };

        Self {
            region: "us-east-1".to_string(),
            access_key: Some(access_key.into()),
            secret_key: Some(secret_key.into()),
            endpoint: Some(endpoint),
            allow_http: !use_ssl,
        }
    }
}

/// Build a client for one container
pub fn create_s3_store(
    config: &S3Config,
    container: &ContainerName,
) -> Result<AmazonS3, StorageError> {
    let mut builder = AmazonS3Builder::from_env()
        .with_bucket_name(container.as_str())
        .with_region(&config.region)
        .with_allow_http(config.allow_http);

    if let Some(access_key) = &config.access_key {
        builder = builder.with_access_key_id(access_key);
    }

    if let Some(secret_key) = &config.secret_key {
        builder = builder.with_secret_access_key(secret_key);
    }

    if let Some(endpoint) = &config.endpoint {
        builder = builder
            .with_endpoint(endpoint)
            .with_virtual_hosted_style_request(false);
    }

    builder.build().map_err(|e| StorageError::InfrastructureError {
        message: format!("Failed to build S3 client for {}", container),
        source: Some(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minio_endpoint_scheme() {
        let plain = S3Config::minio("localhost:9000", "minio", "minio123", false);
        assert_eq!(plain.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(plain.allow_http);

        let tls = S3Config::minio("minio.internal", "minio", "minio123", true);
        assert_eq!(tls.endpoint.as_deref(), Some("https://minio.internal"));
        assert!(!tls.allow_http);
    }

    #[test]
    fn test_build_client_for_container() {
        let config = S3Config::minio("localhost:9000", "minio", "minio123", false);
        let container = ContainerName::new("drive-objects").unwrap();
        assert!(create_s3_store(&config, &container).is_ok());
    }
}
