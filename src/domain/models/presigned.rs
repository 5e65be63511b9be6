use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// HTTP verb a presigned URL is minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PresignMethod {
    Get,
    Put,
}

impl PresignMethod {
    /// Case-insensitive parse; `None` for any other verb
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Self::Put)
    }
}

impl std::fmt::Display for PresignMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PresignMethod> for http::Method {
    fn from(method: PresignMethod) -> Self {
        match method {
            PresignMethod::Get => http::Method::GET,
            PresignMethod::Put => http::Method::PUT,
        }
    }
}

/// Capability narrowing a presign request to one object and direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeToken {
    /// Bucket name the token was issued for
    pub bucket: String,
    /// Object name the token was issued for
    pub object: String,
    pub can_read: bool,
    pub can_write: bool,
    pub expires_at: DateTime<Utc>,
}

impl ScopeToken {
    /// A token is still valid at the exact instant it expires
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn grants(&self, method: PresignMethod) -> bool {
        match method {
            PresignMethod::Get => self.can_read,
            PresignMethod::Put => self.can_write,
        }
    }

    /// Reason the token does not cover the request, if any
    pub fn check(
        &self,
        bucket_name: &str,
        object_name: &str,
        method: PresignMethod,
        now: DateTime<Utc>,
    ) -> Result<(), &'static str> {
        if self.is_expired(now) {
            return Err("scope token expired");
        }
        if self.bucket != bucket_name {
            return Err("scope token bucket mismatch");
        }
        if self.object != object_name {
            return Err("scope token object mismatch");
        }
        if !self.grants(method) {
            return Err(if method.is_write() {
                "scope token does not grant write"
            } else {
                "scope token does not grant read"
            });
        }
        Ok(())
    }
}

/// Request for a direct-access URL to one file
#[derive(Debug, Clone, bon::Builder)]
pub struct PresignRequest {
    pub actor_id: Uuid,
    pub bucket_id: Uuid,
    pub file_id: Uuid,
    /// Raw verb as supplied by the caller
    #[builder(into)]
    pub method: String,
    /// Falls back to the configured default when absent
    pub ttl: Option<Duration>,
    pub scope: Option<ScopeToken>,
}

/// A minted URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
    pub method: PresignMethod,
}

/// Issuance row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedRecord {
    pub id: Uuid,
    pub bucket_id: Uuid,
    pub file_id: Uuid,
    pub object_name: String,
    pub method: PresignMethod,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Audit row naming who asked for the URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub bucket_id: Uuid,
    pub file_id: Uuid,
    pub method: PresignMethod,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn token(can_read: bool, can_write: bool, expires_in: i64) -> ScopeToken {
        ScopeToken {
            bucket: "docs".to_string(),
            object: "b/f".to_string(),
            can_read,
            can_write,
            expires_at: Utc::now() + ChronoDuration::seconds(expires_in),
        }
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(PresignMethod::parse("get"), Some(PresignMethod::Get));
        assert_eq!(PresignMethod::parse(" PUT "), Some(PresignMethod::Put));
        assert_eq!(PresignMethod::parse("DELETE"), None);
        assert_eq!(PresignMethod::parse(""), None);
    }

    #[test]
    fn test_scope_token_checks() {
        let now = Utc::now();
        assert!(token(true, false, 60).check("docs", "b/f", PresignMethod::Get, now).is_ok());
        assert_eq!(
            token(true, false, 60).check("docs", "b/f", PresignMethod::Put, now),
            Err("scope token does not grant write")
        );
        assert_eq!(
            token(true, true, -1).check("docs", "b/f", PresignMethod::Get, now),
            Err("scope token expired")
        );
        assert!(token(true, true, 60).check("other", "b/f", PresignMethod::Get, now).is_err());
        assert!(token(true, true, 60).check("docs", "b/x", PresignMethod::Get, now).is_err());
    }

    #[test]
    fn test_scope_token_valid_until_expiry_instant() {
        let scope = token(true, false, 0);
        let at_expiry = scope.expires_at;

        assert!(!scope.is_expired(at_expiry));
        assert!(scope.check("docs", "b/f", PresignMethod::Get, at_expiry).is_ok());

        let just_after = at_expiry + ChronoDuration::milliseconds(1);
        assert!(scope.is_expired(just_after));
        assert_eq!(
            scope.check("docs", "b/f", PresignMethod::Get, just_after),
            Err("scope token expired")
        );
    }
}
