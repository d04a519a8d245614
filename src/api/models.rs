use axum::{Json, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::errors::{CofundError, ErrorKind};
use crate::core::models::{cart::CartItem, contribution::PaymentMethod, room::RoomMember};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    pub code: String,
    pub members: Vec<RoomMember>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub room_id: String,
    pub user_id: String,
    /// Room code shared with members when the room was created.
    pub code: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct OpenSessionRequest {
    pub items: Vec<CartItem>,
}

#[derive(Deserialize, ToSchema)]
pub struct ContributeRequest {
    pub item_id: Option<String>,
    #[schema(value_type = String, example = "150.00")]
    pub amount: Decimal,
    pub method: PaymentMethod,
}

#[derive(Deserialize, ToSchema)]
pub struct AssignItemRequest {
    pub member_id: String,
    pub address_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectAddressRequest {
    pub address_id: String,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

// Newtype wrapper for CofundError to implement IntoResponse
pub struct ApiError(pub CofundError);

impl From<CofundError> for ApiError {
    fn from(err: CofundError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            CofundError::InvalidAmount(_)
            | CofundError::InvalidInput(..)
            | CofundError::DuplicateItem(_)
            | CofundError::CodNotAllowed(_) => StatusCode::BAD_REQUEST,
            CofundError::RoomNotFound(_)
            | CofundError::SessionNotFound(_)
            | CofundError::ItemNotFound(_)
            | CofundError::UnknownAddress(_) => StatusCode::NOT_FOUND,
            CofundError::UnknownMember(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CofundError::Overfunding { .. } => StatusCode::CONFLICT,
            CofundError::ItemNotFunded(_) | CofundError::CartNotFunded(_) | CofundError::MissingDeliveryAddress(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CofundError::SessionClosed(_) => StatusCode::GONE,
            CofundError::PaymentChannel(_) => StatusCode::PAYMENT_REQUIRED,
            CofundError::OrderService(_) => StatusCode::BAD_GATEWAY,
            CofundError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CofundError::CompensationFailure { .. }
            | CofundError::InternalServerError(_)
            | CofundError::StorageError(_)
            | CofundError::LoggingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}
