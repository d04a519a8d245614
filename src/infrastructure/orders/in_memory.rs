use crate::core::errors::CofundError;
use crate::core::models::order::{OrderReference, OrderSubmission};
use crate::infrastructure::orders::OrderService;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryOrderService {
    submissions: Arc<RwLock<Vec<(OrderReference, OrderSubmission)>>>,
}

impl InMemoryOrderService {
    pub fn new() -> Self {
        InMemoryOrderService {
            submissions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn submissions(&self) -> Vec<(OrderReference, OrderSubmission)> {
        self.submissions.read().await.clone()
    }
}

impl Default for InMemoryOrderService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn submit(&self, submission: &OrderSubmission) -> Result<OrderReference, CofundError> {
        let reference = OrderReference {
            order_id: format!("ord_{}", Uuid::new_v4().simple()),
            session_id: submission.session_id.clone(),
            total_amount: submission.total_amount,
            placed_at: Utc::now(),
        };
        self.submissions
            .write()
            .await
            .push((reference.clone(), submission.clone()));
        Ok(reference)
    }
}
