use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AppLog {
    pub id: String,
    pub action: String,
    /// Room the action belongs to, `None` for system-wide entries.
    pub room_id: Option<String>,
    pub user_id: Option<String>,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionAudit {
    pub id: String,
    pub session_id: String,
    pub action: String,
    pub user_id: Option<String>,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: DateTime<Utc>,
}

/// Operator-visible record of money that moved without a matching ledger entry.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Incident {
    pub id: String,
    pub room_id: String,
    pub session_id: String,
    pub item_id: Option<String>,
    pub transaction_id: String,
    #[schema(value_type = String, example = "600.00")]
    pub amount: Decimal,
    pub reason: String,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: DateTime<Utc>,
}
