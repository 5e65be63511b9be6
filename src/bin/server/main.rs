use anyhow::{Context, Result};
use clap::Parser;
use drive_server::{
    adapters::inbound::http::router::{AppState, create_router},
    app::{AppBuilder, AppConfig, AppServices, RepositoryBackend, StorageBackend},
    config::DriveSettings,
    domain::value_objects::ContainerName,
};
use std::{net::SocketAddr, time::Duration};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "drive-server")]
#[command(about = "Multi-tenant drive storage server", long_about = None)]
struct Cli {
    /// Server port to listen on
    #[arg(short, long, env = "SERVER_PORT", default_value = "3000")]
    port: u16,

    /// Server host to bind to
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Storage backend type: memory, s3 or minio
    #[arg(long, env = "STORAGE_BACKEND", default_value = "memory")]
    storage_backend: String,

    /// Repository backend type: memory or database
    #[arg(long, env = "REPOSITORY_BACKEND", default_value = "memory")]
    repository_backend: String,

    /// S3 endpoint URL (MinIO backend)
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// S3 region
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    s3_region: String,

    /// S3 access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY")]
    s3_secret_key: Option<String>,

    /// Use SSL for MinIO connection
    #[arg(long, env = "MINIO_USE_SSL", default_value = "false")]
    minio_use_ssl: bool,

    /// Database URL for repository backend (PostgreSQL)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Object-store container holding every drive object
    #[arg(long, env = "DRIVE_OBJECT_CONTAINER", default_value = "drive-objects")]
    container: String,

    /// Upload ceiling in bytes
    #[arg(long, env = "DRIVE_MAX_FILE_SIZE", default_value_t = drive_server::config::DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,

    /// Default presigned URL lifetime
    #[arg(long, env = "DRIVE_PRESIGN_TTL_SECS", default_value = "900")]
    presign_ttl_secs: u64,

    /// Bound on each metadata or control-plane call
    #[arg(long, env = "DRIVE_OPERATION_TIMEOUT_SECS", default_value = "5")]
    operation_timeout_secs: u64,

    /// Bound on streaming transfers
    #[arg(long, env = "DRIVE_TRANSFER_TIMEOUT_SECS", default_value = "300")]
    transfer_timeout_secs: u64,

    /// Minimum object age before the orphan sweep may remove it
    #[arg(long, env = "DRIVE_ORPHAN_GRACE_SECS", default_value = "3600")]
    orphan_grace_secs: u64,

    /// Run the orphan sweep on this interval; disabled when unset
    #[arg(long, env = "DRIVE_SWEEP_INTERVAL_SECS")]
    sweep_interval_secs: Option<u64>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn to_app_config(&self) -> Result<AppConfig> {
        let storage_backend = match self.storage_backend.as_str() {
            "memory" => StorageBackend::InMemory,
            "s3" => StorageBackend::S3 {
                region: self.s3_region.clone(),
                access_key: self.s3_access_key.clone(),
                secret_key: self.s3_secret_key.clone(),
            },
            "minio" => {
                let endpoint = self
                    .s3_endpoint
                    .clone()
                    .context("S3_ENDPOINT is required for MinIO backend")?;
                let access_key = self
                    .s3_access_key
                    .clone()
                    .context("S3_ACCESS_KEY is required for MinIO backend")?;
                let secret_key = self
                    .s3_secret_key
                    .clone()
                    .context("S3_SECRET_KEY is required for MinIO backend")?;

                StorageBackend::MinIO {
                    endpoint,
                    access_key,
                    secret_key,
                    use_ssl: self.minio_use_ssl,
                }
            }
            _ => anyhow::bail!("Unknown storage backend: {}", self.storage_backend),
        };

        let repository_backend = match self.repository_backend.as_str() {
            "memory" => RepositoryBackend::InMemory,
            "database" | "db" => {
                let connection_string = self
                    .database_url
                    .clone()
                    .context("DATABASE_URL is required for database backend")?;
                RepositoryBackend::Database { connection_string }
            }
            _ => anyhow::bail!("Unknown repository backend: {}", self.repository_backend),
        };

        Ok(AppConfig {
            storage_backend,
            repository_backend,
            settings: self.settings()?,
        })
    }

    fn settings(&self) -> Result<DriveSettings> {
        let object_container = ContainerName::new(self.container.clone())
            .with_context(|| format!("invalid container name `{}`", self.container))?;

        Ok(DriveSettings {
            object_container,
            max_file_size: self.max_file_size,
            presign_ttl: Duration::from_secs(self.presign_ttl_secs),
            operation_timeout: Duration::from_secs(self.operation_timeout_secs),
            transfer_timeout: Duration::from_secs(self.transfer_timeout_secs),
            orphan_grace_period: Duration::from_secs(self.orphan_grace_secs),
        })
    }

    fn init_logging(&self) -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .context("invalid log level")?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("failed to install tracing subscriber")?;

        Ok(())
    }
}

/// Run the orphan sweep forever on a fixed interval
fn spawn_orphan_sweep(services: &AppServices, every: Duration) {
    let reconciliation = services.reconciliation_service.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = reconciliation.sweep_orphans().await {
                warn!(error = %e, "scheduled orphan sweep failed");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    info!("Starting drive server");
    info!("Storage backend: {}", cli.storage_backend);
    info!("Repository backend: {}", cli.repository_backend);

    let config = cli.to_app_config()?;
    let app_services = AppBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("Failed to build application")?;

    if let Some(secs) = cli.sweep_interval_secs.filter(|s| *s > 0) {
        info!(interval_secs = secs, "scheduling orphan sweep");
        spawn_orphan_sweep(&app_services, Duration::from_secs(secs));
    }

    let router = create_router(AppState::from(&app_services));

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start server")?;

    Ok(())
}
