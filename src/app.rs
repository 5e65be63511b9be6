use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

use crate::{
    adapters::outbound::{
        metrics::TracingMetricsRecorder,
        persistence::{
            InMemoryMetadataStore, SqlBucketRepository, SqlFileRepository,
            SqlPresignedRepository, SqlUsageRepository, migrate,
        },
        storage::{ApacheObjectStoreAdapter, S3Config, StoreProvider},
    },
    config::DriveSettings,
    ports::{
        metrics::MetricsRecorder,
        repositories::{BucketRepository, FileRepository, PresignedRepository, UsageRepository},
        services::{
            BucketService, FileService, HealthService, PresignedService, ReconciliationService,
            UsageService,
        },
        storage::ObjectStore,
    },
    services::{
        BucketServiceImpl, FileServiceImpl, HealthServiceImpl, PresignedServiceImpl,
        ReconciliationServiceImpl, UsageServiceImpl,
    },
};

/// Connections kept by the Postgres pool
const DEFAULT_POOL_SIZE: u32 = 10;

/// Configuration for the application
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub repository_backend: RepositoryBackend,
    pub settings: DriveSettings,
}

/// Storage backend configuration
#[derive(Debug, Clone, Default)]
pub enum StorageBackend {
    #[default]
    InMemory,
    S3 {
        region: String,
        access_key: Option<String>,
        secret_key: Option<String>,
    },
    MinIO {
        endpoint: String,
        access_key: String,
        secret_key: String,
        use_ssl: bool,
    },
}

impl StorageBackend {
    fn provider(&self) -> StoreProvider {
        match self {
            StorageBackend::InMemory => StoreProvider::InMemory,
            StorageBackend::S3 {
                region,
                access_key,
                secret_key,
            } => StoreProvider::S3(S3Config {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
                ..S3Config::aws(region.clone())
            }),
            StorageBackend::MinIO {
                endpoint,
                access_key,
                secret_key,
                use_ssl,
            } => StoreProvider::S3(S3Config::minio(
                endpoint.clone(),
                access_key.clone(),
                secret_key.clone(),
                *use_ssl,
            )),
        }
    }
}

/// Repository backend configuration
#[derive(Clone, Default)]
pub enum RepositoryBackend {
    #[default]
    InMemory,
    Database { connection_string: String },
}

impl std::fmt::Debug for RepositoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryBackend::InMemory => f.write_str("InMemory"),
            // connection strings carry credentials
            RepositoryBackend::Database { .. } => f.write_str("Database { .. }"),
        }
    }
}

/// Application dependencies container
#[derive(Clone)]
pub struct AppDependencies {
    pub object_store: Arc<dyn ObjectStore>,
    pub bucket_repository: Arc<dyn BucketRepository>,
    pub file_repository: Arc<dyn FileRepository>,
    pub usage_repository: Arc<dyn UsageRepository>,
    pub presigned_repository: Arc<dyn PresignedRepository>,
    pub metrics: Arc<dyn MetricsRecorder>,
}

/// Application services container
#[derive(Clone)]
pub struct AppServices {
    pub bucket_service: Arc<dyn BucketService>,
    pub file_service: Arc<dyn FileService>,
    pub usage_service: Arc<dyn UsageService>,
    pub presigned_service: Arc<dyn PresignedService>,
    pub health_service: Arc<dyn HealthService>,
    pub reconciliation_service: Arc<dyn ReconciliationService>,
    pub object_store: Arc<dyn ObjectStore>,
    pub settings: DriveSettings,
}

impl AppServices {
    /// Wire every service over the given dependencies
    pub fn from_dependencies(deps: AppDependencies, settings: DriveSettings) -> Self {
        let usage_service: Arc<dyn UsageService> = Arc::new(UsageServiceImpl::new(
            deps.usage_repository.clone(),
            settings.clone(),
        ));

        let bucket_service = Arc::new(BucketServiceImpl::new(
            deps.bucket_repository.clone(),
            deps.file_repository.clone(),
            deps.object_store.clone(),
            usage_service.clone(),
            settings.clone(),
            deps.metrics.clone(),
        ));

        let file_service = Arc::new(FileServiceImpl::new(
            deps.bucket_repository.clone(),
            deps.file_repository.clone(),
            deps.object_store.clone(),
            usage_service.clone(),
            settings.clone(),
            deps.metrics.clone(),
        ));

        let presigned_service = Arc::new(PresignedServiceImpl::new(
            deps.bucket_repository.clone(),
            deps.file_repository.clone(),
            deps.presigned_repository.clone(),
            deps.object_store.clone(),
            settings.clone(),
            deps.metrics.clone(),
        ));

        let health_service = Arc::new(HealthServiceImpl::new(
            deps.bucket_repository.clone(),
            deps.object_store.clone(),
            settings.clone(),
        ));

        let reconciliation_service = Arc::new(ReconciliationServiceImpl::new(
            deps.file_repository.clone(),
            deps.object_store.clone(),
            settings.clone(),
            deps.metrics.clone(),
        ));

        AppServices {
            bucket_service,
            file_service,
            usage_service,
            presigned_service,
            health_service,
            reconciliation_service,
            object_store: deps.object_store,
            settings,
        }
    }
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
    metrics: Arc<dyn MetricsRecorder>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            metrics: Arc::new(TracingMetricsRecorder),
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    /// Configure repository backend
    pub fn with_repository_backend(mut self, backend: RepositoryBackend) -> Self {
        self.config.repository_backend = backend;
        self
    }

    pub fn with_settings(mut self, settings: DriveSettings) -> Self {
        self.config.settings = settings;
        self
    }

    /// Replace the default tracing-backed metrics recorder
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Build the application dependencies
    ///
    /// Ensures the object container exists and, for a database backend,
    /// bootstraps the schema.
    pub async fn build_dependencies(&self) -> Result<AppDependencies, AppError> {
        let object_store = self.create_object_store().await?;
        let (bucket_repository, file_repository, usage_repository, presigned_repository) =
            self.create_repositories().await?;

        Ok(AppDependencies {
            object_store,
            bucket_repository,
            file_repository,
            usage_repository,
            presigned_repository,
            metrics: self.metrics.clone(),
        })
    }

    /// Build the complete application with services
    pub async fn build(self) -> Result<AppServices, AppError> {
        let deps = self.build_dependencies().await?;
        Ok(AppServices::from_dependencies(deps, self.config.settings))
    }

    /// Create the object store adapter and make sure its container exists
    async fn create_object_store(&self) -> Result<Arc<dyn ObjectStore>, AppError> {
        let store = ApacheObjectStoreAdapter::new(self.config.storage_backend.provider());
        let container = &self.config.settings.object_container;

        let storage_init = |e: crate::domain::errors::StorageError| AppError::StorageInit {
            message: format!("container {}: {}", container, e),
        };

        if !store.container_exists(container).await.map_err(storage_init)? {
            info!(%container, "creating object container");
            store
                .create_container(container)
                .await
                .map_err(storage_init)?;
        }

        Ok(Arc::new(store))
    }

    /// Create repositories based on configuration
    #[allow(clippy::type_complexity)]
    async fn create_repositories(
        &self,
    ) -> Result<
        (
            Arc<dyn BucketRepository>,
            Arc<dyn FileRepository>,
            Arc<dyn UsageRepository>,
            Arc<dyn PresignedRepository>,
        ),
        AppError,
    > {
        match &self.config.repository_backend {
            RepositoryBackend::InMemory => {
                let store = InMemoryMetadataStore::new();
                let buckets: Arc<dyn BucketRepository> = Arc::new(store.clone());
                let files: Arc<dyn FileRepository> = Arc::new(store.clone());
                let usage: Arc<dyn UsageRepository> = Arc::new(store.clone());
                let presigned: Arc<dyn PresignedRepository> = Arc::new(store);
                Ok((buckets, files, usage, presigned))
            }
            RepositoryBackend::Database { connection_string } => {
                let pool = PgPoolOptions::new()
                    .max_connections(DEFAULT_POOL_SIZE)
                    .acquire_timeout(self.config.settings.operation_timeout)
                    .connect(connection_string)
                    .await
                    .map_err(|e| AppError::RepositoryInit {
                        message: format!("connecting to database: {}", e),
                    })?;

                migrate(&pool).await.map_err(|e| AppError::RepositoryInit {
                    message: format!("applying schema: {}", e),
                })?;
                info!("metadata schema ready");

                let buckets: Arc<dyn BucketRepository> =
                    Arc::new(SqlBucketRepository::new(pool.clone()));
                let files: Arc<dyn FileRepository> = Arc::new(SqlFileRepository::new(pool.clone()));
                let usage: Arc<dyn UsageRepository> =
                    Arc::new(SqlUsageRepository::new(pool.clone()));
                let presigned: Arc<dyn PresignedRepository> =
                    Arc::new(SqlPresignedRepository::new(pool));
                Ok((buckets, files, usage, presigned))
            }
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    StorageInit { message: String },

    #[error("Repository initialization error: {message}")]
    RepositoryInit { message: String },
}

/// Convenience functions for common configurations
///
/// Create an in-memory application for testing and development
pub async fn create_in_memory_app() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory)
        .with_repository_backend(RepositoryBackend::InMemory)
        .build()
        .await
}

fn required_var(name: &str) -> Result<String, AppError> {
    std::env::var(name).map_err(|_| AppError::Configuration {
        message: format!("{} environment variable required", name),
    })
}

/// Read the backend selection and `DRIVE_*` settings from the environment
pub fn config_from_env() -> Result<AppConfig, AppError> {
    let storage_backend = match std::env::var("STORAGE_BACKEND").as_deref() {
        Ok("s3") => StorageBackend::S3 {
            region: required_var("S3_REGION")?,
            access_key: std::env::var("S3_ACCESS_KEY").ok(),
            secret_key: std::env::var("S3_SECRET_KEY").ok(),
        },
        Ok("minio") => StorageBackend::MinIO {
            endpoint: required_var("MINIO_ENDPOINT")?,
            access_key: required_var("MINIO_ACCESS_KEY")?,
            secret_key: required_var("MINIO_SECRET_KEY")?,
            use_ssl: std::env::var("MINIO_USE_SSL")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        },
        Ok("memory") | Err(_) => StorageBackend::InMemory,
        Ok(other) => {
            return Err(AppError::Configuration {
                message: format!("unknown STORAGE_BACKEND `{}`", other),
            });
        }
    };

    let repository_backend = match std::env::var("REPOSITORY_BACKEND").as_deref() {
        Ok("database") => RepositoryBackend::Database {
            connection_string: required_var("DATABASE_URL")?,
        },
        Ok("memory") | Err(_) => RepositoryBackend::InMemory,
        Ok(other) => {
            return Err(AppError::Configuration {
                message: format!("unknown REPOSITORY_BACKEND `{}`", other),
            });
        }
    };

    Ok(AppConfig {
        storage_backend,
        repository_backend,
        settings: DriveSettings::from_env()?,
    })
}

/// Create application from environment variables
pub async fn create_app_from_env() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_config(config_from_env()?)
        .build()
        .await
}
