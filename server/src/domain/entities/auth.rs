//! Access-control entities: API tokens and User-Agent rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bearer token granting access to the compatibility API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiToken {
    pub id: i64,
    pub name: String,
    pub token: String,
    pub is_enabled: bool,
    /// None means the token never expires
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApiToken {
    /// A token is valid when enabled and not past its expiry
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_enabled && self.expires_at.map(|e| e > now).unwrap_or(true)
    }
}

/// A denylist entry matched as a substring against incoming `User-Agent`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UaRule {
    pub id: i64,
    pub ua_string: String,
    pub created_at: DateTime<Utc>,
}
