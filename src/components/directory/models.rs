use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

fn default_active() -> bool {
    true
}

/// A worker as returned by the worker API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Companies the worker has a contract with
    #[serde(default)]
    pub company_ids: Vec<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Worker {
    /// First and last name joined
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A company workers can be paid through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tax_id: Option<String>,
}

/// JWT obtained from the token exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl ApiToken {
    /// Seconds before expiry at which the token is already treated as expired
    pub const EXPIRY_SKEW_SECONDS: i64 = 60;

    /// Build a token that expires `expires_in` seconds after `now`
    pub fn new(access_token: String, expires_in: i64, now: DateTime<Utc>) -> Self {
        Self {
            access_token,
            expires_at: now + Duration::seconds(expires_in),
        }
    }

    /// Check whether the token should be exchanged again
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(Self::EXPIRY_SKEW_SECONDS) >= self.expires_at
    }
}
