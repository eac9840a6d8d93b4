use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::store::{StoreStats, Subscriber};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Public read: just the active-subscriber count.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

/// Admin full listing, soft-deleted rows included.
#[derive(Debug, Serialize)]
pub struct AdminListResponse {
    pub emails: Vec<Subscriber>,
    pub stats: StoreStats,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
}

static START_TIME: std::sync::LazyLock<SystemTime> = std::sync::LazyLock::new(SystemTime::now);

impl HealthResponse {
    pub fn healthy() -> Self {
        let now = SystemTime::now();
        Self {
            status: "healthy".to_string(),
            timestamp: now
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: now.duration_since(*START_TIME).unwrap_or_default().as_secs(),
        }
    }
}
