use super::{address::DeliveryAddress, assignment::Assignment, cart::CartItem, contribution::Contributor};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct OrderReference {
    pub order_id: String,
    pub session_id: String,
    #[schema(value_type = String, example = "1000.00")]
    pub total_amount: Decimal,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub placed_at: DateTime<Utc>,
}

/// Everything the order service needs to fulfil a funded cart.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderSubmission {
    pub session_id: String,
    pub room_id: String,
    pub items: Vec<CartItem>,
    #[schema(value_type = String, example = "1000.00")]
    pub total_amount: Decimal,
    pub contributors: Vec<Contributor>,
    pub assignments: Vec<Assignment>,
    pub delivery_address: Option<DeliveryAddress>,
}
