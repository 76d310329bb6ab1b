use crate::context::AppContext;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Round-trips a trivial query through the store. Never fails; problems are
/// reported in the status.
pub fn health(ctx: &AppContext) -> HealthStatus {
    match ctx.store().ping() {
        Ok(()) => HealthStatus {
            status: "ok".to_string(),
            database: Some("connected".to_string()),
            error: None,
        },
        Err(err) => {
            warn!(error = %err, "health check failed");
            HealthStatus {
                status: "error".to_string(),
                database: None,
                error: Some(err.to_string()),
            }
        }
    }
}
