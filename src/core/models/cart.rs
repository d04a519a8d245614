use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One product line in a room's shared cart.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    #[schema(value_type = String, example = "250.00")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    pub fn target_amount(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
