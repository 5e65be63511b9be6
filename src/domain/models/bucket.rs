use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UsageStats;
use crate::domain::value_objects::BucketName;

/// An owner-scoped logical container for files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Live counters; zero until the first file lands
    pub usage: UsageStats,
}

/// Insert request for the metadata store
#[derive(Debug, Clone)]
pub struct NewBucket {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: BucketName,
    pub description: Option<String>,
}

impl NewBucket {
    pub fn new(owner_id: Uuid, name: BucketName, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        }
    }
}
