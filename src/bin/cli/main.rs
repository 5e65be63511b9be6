use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response, multipart};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "drive-cli")]
#[command(about = "CLI for interacting with the drive server", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(short, long, env = "DRIVE_URL", default_value = "http://localhost:3000")]
    url: String,

    /// Identity forwarded as x-user-id
    #[arg(long, env = "DRIVE_USER_ID")]
    user_id: Uuid,

    /// Send x-user-admin: true
    #[arg(long, env = "DRIVE_USER_ADMIN", default_value = "false")]
    admin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage buckets
    Bucket {
        #[command(subcommand)]
        command: BucketCommands,
    },

    /// Manage files inside a bucket
    File {
        #[command(subcommand)]
        command: FileCommands,
    },

    /// Issue a presigned URL for a file
    Presign {
        bucket: Uuid,
        file: Uuid,
        /// GET or PUT
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// URL lifetime in seconds
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Show usage snapshot history
    Usage {
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Remove orphaned objects (admin)
    Reconcile,

    /// Check server readiness
    Health,
}

#[derive(Subcommand, Debug)]
enum BucketCommands {
    List,
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    Get {
        bucket: Uuid,
    },
    Delete {
        bucket: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum FileCommands {
    List {
        bucket: Uuid,
    },
    /// Upload a local file
    Upload {
        bucket: Uuid,
        path: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Download a file; writes to stdout when no output is given
    Download {
        bucket: Uuid,
        file: Uuid,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Delete {
        bucket: Uuid,
        file: Uuid,
    },
}

struct DriveClient {
    http: Client,
    base: String,
    user_id: Uuid,
    admin: bool,
}

impl DriveClient {
    fn new(base: &str, user_id: Uuid, admin: bool) -> Self {
        Self {
            http: Client::new(),
            base: base.trim_end_matches('/').to_string(),
            user_id,
            admin,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base, path))
            .header("x-user-id", self.user_id.to_string());
        if self.admin {
            builder.header("x-user-admin", "true")
        } else {
            builder
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.context("request failed")?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        bail!("{}: {}", status, message)
    }

    async fn json(&self, builder: RequestBuilder) -> Result<Value> {
        let response = self.send(builder).await?;
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(json!({ "status": "ok" }));
        }
        Ok(response.json().await?)
    }

    async fn upload(&self, bucket: Uuid, path: &Path, content_type: Option<String>) -> Result<Value> {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        let size = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let mut part = multipart::Part::stream_with_length(body, size).file_name(file_name);
        if let Some(ct) = content_type {
            part = part.mime_str(&ct)?;
        }
        let form = multipart::Form::new().part("file", part);

        self.json(
            self.request(Method::POST, &format!("/v1/buckets/{}/files", bucket))
                .header("x-file-size", size.to_string())
                .multipart(form),
        )
        .await
    }

    async fn download(&self, bucket: Uuid, file: Uuid, output: Option<&Path>) -> Result<()> {
        let response = self
            .send(self.request(
                Method::GET,
                &format!("/v1/buckets/{}/files/{}/download", bucket, file),
            ))
            .await?;

        let mut sink: Box<dyn tokio::io::AsyncWrite + Unpin + Send> = match output {
            Some(path) => Box::new(
                tokio::fs::File::create(path)
                    .await
                    .with_context(|| format!("creating {}", path.display()))?,
            ),
            None => Box::new(tokio::io::stdout()),
        };

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            sink.write_all(&chunk?).await?;
        }
        sink.flush().await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = DriveClient::new(&cli.url, cli.user_id, cli.admin);

    let output = match cli.command {
        Commands::Bucket { command } => match command {
            BucketCommands::List => client.json(client.request(Method::GET, "/v1/buckets")).await?,
            BucketCommands::Create { name, description } => {
                client
                    .json(
                        client
                            .request(Method::POST, "/v1/buckets")
                            .json(&json!({ "name": name, "description": description })),
                    )
                    .await?
            }
            BucketCommands::Get { bucket } => {
                client
                    .json(client.request(Method::GET, &format!("/v1/buckets/{}", bucket)))
                    .await?
            }
            BucketCommands::Delete { bucket } => {
                client
                    .json(client.request(Method::DELETE, &format!("/v1/buckets/{}", bucket)))
                    .await?
            }
        },
        Commands::File { command } => match command {
            FileCommands::List { bucket } => {
                client
                    .json(client.request(Method::GET, &format!("/v1/buckets/{}/files", bucket)))
                    .await?
            }
            FileCommands::Upload {
                bucket,
                path,
                content_type,
            } => client.upload(bucket, &path, content_type).await?,
            FileCommands::Download {
                bucket,
                file,
                output,
            } => {
                client.download(bucket, file, output.as_deref()).await?;
                return Ok(());
            }
            FileCommands::Delete { bucket, file } => {
                client
                    .json(client.request(
                        Method::DELETE,
                        &format!("/v1/buckets/{}/files/{}", bucket, file),
                    ))
                    .await?
            }
        },
        Commands::Presign {
            bucket,
            file,
            method,
            ttl,
        } => {
            client
                .json(
                    client
                        .request(
                            Method::POST,
                            &format!("/v1/buckets/{}/files/{}/presigned-url", bucket, file),
                        )
                        .json(&json!({ "method": method, "ttl_seconds": ttl })),
                )
                .await?
        }
        Commands::Usage { limit } => {
            let mut request = client.request(Method::GET, "/v1/usage/snapshots");
            if let Some(limit) = limit {
                request = request.query(&[("limit", limit)]);
            }
            client.json(request).await?
        }
        Commands::Reconcile => {
            client
                .json(client.request(Method::POST, "/v1/admin/reconcile"))
                .await?
        }
        Commands::Health => client.json(client.request(Method::GET, "/health/ready")).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let user = Uuid::new_v4();
        let bucket = Uuid::new_v4();
        let cli = Cli::parse_from([
            "drive-cli".to_string(),
            "--user-id".to_string(),
            user.to_string(),
            "file".to_string(),
            "upload".to_string(),
            bucket.to_string(),
            "notes.txt".to_string(),
        ]);

        assert_eq!(cli.user_id, user);
        match cli.command {
            Commands::File {
                command: FileCommands::Upload { bucket: b, path, .. },
            } => {
                assert_eq!(b, bucket);
                assert_eq!(path, PathBuf::from("notes.txt"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_base_url_trimmed() {
        let client = DriveClient::new("http://localhost:3000/", Uuid::nil(), false);
        assert_eq!(client.base, "http://localhost:3000");
    }
}
