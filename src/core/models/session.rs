use super::{address::DeliveryAddress, assignment::Assignment, cart::CartItem, contribution::Contributor, order::OrderReference};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum SessionStatus {
    Open,
    /// Order service call in flight; assignment changes are refused.
    Submitting,
    Placed { order: OrderReference },
    Abandoned {
        #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
        abandoned_at: DateTime<Utc>,
    },
}

impl SessionStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Open)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Unfunded,
    Funded,
    Assigned,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FundingProgress {
    pub item_id: String,
    #[schema(value_type = String, example = "1000.00")]
    pub target_amount: Decimal,
    #[schema(value_type = String, example = "400.00")]
    pub current_amount: Decimal,
    #[schema(value_type = String, example = "600.00")]
    pub remaining_amount: Decimal,
    #[schema(value_type = String, example = "40.00")]
    pub percent: Decimal,
    pub is_complete: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CartSummary {
    #[schema(value_type = String, example = "1000.00")]
    pub total_target: Decimal,
    #[schema(value_type = String, example = "400.00")]
    pub total_contributed: Decimal,
    #[schema(value_type = String, example = "600.00")]
    pub total_remaining: Decimal,
    pub funded_items: usize,
    pub total_items: usize,
    pub all_items_funded: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemSnapshot {
    pub item: CartItem,
    pub state: ItemState,
    pub progress: FundingProgress,
    pub contributors: Vec<Contributor>,
    pub assignment: Option<Assignment>,
}

/// Read-only view of a checkout session rendered by clients.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSnapshot {
    pub session_id: String,
    pub room_id: String,
    pub status: SessionStatus,
    pub items: Vec<ItemSnapshot>,
    pub summary: CartSummary,
    pub delivery_address: Option<DeliveryAddress>,
    pub all_items_funded: bool,
    pub can_proceed_to_order: bool,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

/// A contributed pledge left behind in an abandoned session.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct OrphanedPledge {
    pub session_id: String,
    pub room_id: String,
    pub contributor: Contributor,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub abandoned_at: DateTime<Utc>,
}
