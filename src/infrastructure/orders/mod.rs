pub mod in_memory;

use crate::core::errors::CofundError;
use crate::core::models::order::{OrderReference, OrderSubmission};
use async_trait::async_trait;

/// External order service. It does not deduplicate; idempotency is the caller's job.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn submit(&self, submission: &OrderSubmission) -> Result<OrderReference, CofundError>;
}
