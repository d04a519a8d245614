use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

/// Coarse classification used by callers to decide whether to retry, re-quote or escalate.
#[derive(Clone, Copy, Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Overfunding,
    PaymentChannel,
    CompensationFailure,
    SessionClosed,
    Upstream,
    Unauthorized,
    Internal,
}

#[derive(Error, Clone, Debug, Serialize, PartialEq, Eq)]
pub enum CofundError {
    /// Amount is zero, negative or not representable in minor units
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    #[error("Room {0} not found")]
    RoomNotFound(String),

    #[error("Checkout session {0} not found")]
    SessionNotFound(String),

    #[error("Cart item {0} not found")]
    ItemNotFound(String),

    #[error("Cart item {0} appears more than once")]
    DuplicateItem(String),

    /// Member is not part of the room
    #[error("User {0} is not a room member")]
    UnknownMember(String),

    /// Address is not in the room's saved-address set
    #[error("Address {0} not found")]
    UnknownAddress(String),

    #[error("Cash on delivery not allowed: {0}")]
    CodNotAllowed(String),

    /// Contribution would push the item past its target
    #[error("Contribution of {requested} to item {item_id} exceeds remaining amount {remaining}")]
    Overfunding {
        item_id: String,
        requested: Decimal,
        remaining: Decimal,
    },

    #[error("Cart item {0} is not fully funded")]
    ItemNotFunded(String),

    #[error("Cart is not fully funded; unfunded items: {0:?}")]
    CartNotFunded(Vec<String>),

    #[error("No delivery address resolved for item {0}")]
    MissingDeliveryAddress(String),

    /// Session is placed, being submitted, or abandoned
    #[error("Checkout session {0} is closed")]
    SessionClosed(String),

    #[error("Payment channel error: {0}")]
    PaymentChannel(String),

    /// A refund for an overcommitted payment failed; money and ledger disagree
    #[error("Compensation failed for transaction {transaction_id} ({amount}); incident {incident_id}")]
    CompensationFailure {
        incident_id: String,
        transaction_id: String,
        amount: Decimal,
        reason: String,
    },

    #[error("Order service error: {0}")]
    OrderService(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl CofundError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CofundError::InvalidAmount(_)
            | CofundError::InvalidInput(..)
            | CofundError::RoomNotFound(_)
            | CofundError::SessionNotFound(_)
            | CofundError::ItemNotFound(_)
            | CofundError::DuplicateItem(_)
            | CofundError::UnknownMember(_)
            | CofundError::UnknownAddress(_)
            | CofundError::CodNotAllowed(_)
            | CofundError::ItemNotFunded(_)
            | CofundError::CartNotFunded(_)
            | CofundError::MissingDeliveryAddress(_) => ErrorKind::Validation,
            CofundError::Overfunding { .. } => ErrorKind::Overfunding,
            CofundError::PaymentChannel(_) => ErrorKind::PaymentChannel,
            CofundError::CompensationFailure { .. } => ErrorKind::CompensationFailure,
            CofundError::SessionClosed(_) => ErrorKind::SessionClosed,
            CofundError::OrderService(_) => ErrorKind::Upstream,
            CofundError::Unauthorized(_) => ErrorKind::Unauthorized,
            CofundError::InternalServerError(_) | CofundError::StorageError(_) | CofundError::LoggingError(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether the same call may be resubmitted unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::PaymentChannel | ErrorKind::Upstream)
    }

    pub(crate) fn invalid_input(field: &str, title: &str, description: impl Into<String>) -> Self {
        CofundError::InvalidInput(
            field.to_string(),
            FieldError {
                field: field.to_string(),
                title: title.to_string(),
                description: description.into(),
            },
        )
    }
}
