use crate::core::errors::CofundError;
use crate::core::models::audit::AppLog;
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

const DEFAULT_RETENTION: usize = 10_000;

/// Bounded application log. Once `retention` entries are held the oldest is dropped.
#[derive(Clone)]
pub struct InMemoryLogging {
    entries: Arc<RwLock<VecDeque<AppLog>>>,
    retention: usize,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: usize) -> Self {
        InMemoryLogging {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            retention: retention.max(1),
        }
    }
}

impl Default for InMemoryLogging {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        action: &str,
        room_id: Option<&str>,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), CofundError> {
        if !details.is_object() {
            return Err(CofundError::LoggingError(format!(
                "Details for {} must be a JSON object",
                action
            )));
        }
        tracing::debug!(target: "cofund::audit", action, room_id, user_id, %details);

        let entry = AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            room_id: room_id.map(String::from),
            user_id: user_id.map(String::from),
            details,
            timestamp: Utc::now(),
        };
        let mut entries = self.entries.write().await;
        if entries.len() == self.retention {
            entries.pop_front();
        }
        entries.push_back(entry);
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, CofundError> {
        Ok(self.entries.read().await.iter().cloned().collect())
    }
}
