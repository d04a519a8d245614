use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Wallet,
    MultiPartyLink,
    Cod,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::MultiPartyLink => "multi_party_link",
            PaymentMethod::Cod => "cod",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContributionStatus {
    Pending,
    Contributed,
    Confirmed,
}

/// A single pledge toward one cart item.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Contributor {
    pub id: String,
    pub item_id: String,
    pub user_id: String,
    pub username: String,
    #[schema(value_type = String, example = "150.00")]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: ContributionStatus,
    pub transaction_id: Option<String>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

impl Contributor {
    pub fn pending(item_id: &str, user_id: &str, username: &str, amount: Decimal, method: PaymentMethod) -> Self {
        Contributor {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            amount,
            payment_method: method,
            status: ContributionStatus::Pending,
            transaction_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn contributed(mut self, transaction_id: &str) -> Self {
        self.status = ContributionStatus::Contributed;
        self.transaction_id = Some(transaction_id.to_string());
        self
    }

    pub fn confirm(&mut self) {
        if self.status == ContributionStatus::Contributed {
            self.status = ContributionStatus::Confirmed;
        }
    }
}

/// Funding state for one cart item. `current_amount` only grows and never passes `target_amount`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ContributionTarget {
    pub item_id: String,
    #[schema(value_type = String, example = "1000.00")]
    pub target_amount: Decimal,
    #[schema(value_type = String, example = "400.00")]
    pub current_amount: Decimal,
    pub is_complete: bool,
}

impl ContributionTarget {
    pub fn new(item_id: &str, target_amount: Decimal) -> Self {
        ContributionTarget {
            item_id: item_id.to_string(),
            target_amount,
            current_amount: Decimal::ZERO,
            is_complete: target_amount <= Decimal::ZERO,
        }
    }

    pub fn remaining_amount(&self) -> Decimal {
        (self.target_amount - self.current_amount).max(Decimal::ZERO)
    }

    /// Applies a committed pledge. Callers must have checked `amount <= remaining_amount()`.
    pub(crate) fn commit(&mut self, amount: Decimal) {
        self.current_amount += amount;
        self.is_complete = self.current_amount >= self.target_amount;
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ContributionRequest {
    /// Required for wallet and link payments; ignored for cash on delivery, which covers the whole cart.
    pub item_id: Option<String>,
    pub user_id: String,
    #[schema(value_type = String, example = "150.00")]
    pub amount: Decimal,
    pub method: PaymentMethod,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ContributionReceipt {
    pub transaction_id: String,
    pub payment_method: PaymentMethod,
    pub contributors: Vec<Contributor>,
    pub all_items_funded: bool,
}
