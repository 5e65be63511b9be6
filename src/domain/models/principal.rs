use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An already-authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}
