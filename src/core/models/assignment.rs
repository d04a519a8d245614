use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Binds a funded cart item to the member receiving it and where it ships.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Assignment {
    pub item_id: String,
    pub member_id: String,
    pub address_id: String,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub assigned_at: DateTime<Utc>,
}
