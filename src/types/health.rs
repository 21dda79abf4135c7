use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `"healthy"` when the backend is up.
    pub status: String,

    /// Time reported by the backend.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,
}

impl HealthStatus {
    /// Returns true if the backend reports itself healthy.
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Free-form status line.
    pub status: String,

    /// Backend version.
    pub version: String,

    /// Whether the backend forwards to a hosted model.
    #[serde(default)]
    pub azure_ai_enabled: bool,
}
