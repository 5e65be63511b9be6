use async_trait::async_trait;

use crate::domain::{
    errors::DriveResult,
    models::{PresignRequest, PresignedUrl},
};

#[async_trait]
pub trait PresignedService: Send + Sync + 'static {
    /// Validate ownership and scope, mint a URL, and record its issuance
    async fn generate_url(&self, request: PresignRequest) -> DriveResult<PresignedUrl>;
}
