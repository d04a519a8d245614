use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Postal address shared by every member of a room.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DeliveryAddress {
    pub id: String,
    pub room_id: String,
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}
