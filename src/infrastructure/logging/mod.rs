pub mod in_memory;

use crate::core::errors::CofundError;
use crate::core::models::audit::AppLog;
use async_trait::async_trait;

#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn log_action(
        &self,
        action: &str,
        room_id: Option<&str>,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), CofundError>;
    async fn get_logs(&self) -> Result<Vec<AppLog>, CofundError>;
}
