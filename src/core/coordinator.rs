use crate::core::errors::CofundError;
use crate::core::models::{
    order::{OrderReference, OrderSubmission},
    session::SessionStatus,
};
use crate::core::session::CheckoutSession;
use crate::infrastructure::orders::OrderService;
use crate::infrastructure::storage::Storage;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Final gate before an order reaches the order service.
///
/// Placement is keyed on the session id: once a session is placed, every later call
/// returns the original reference without touching the order service.
pub struct OrderPlacementCoordinator<'a, O: OrderService, S: Storage> {
    orders: &'a O,
    storage: &'a S,
}

impl<'a, O: OrderService, S: Storage> OrderPlacementCoordinator<'a, O, S> {
    pub fn new(orders: &'a O, storage: &'a S) -> Self {
        OrderPlacementCoordinator { orders, storage }
    }

    pub async fn place_order(&self, session: &CheckoutSession) -> Result<OrderReference, CofundError> {
        let _placement = session.placement().lock().await;

        match session.status().await {
            SessionStatus::Placed { order } => {
                info!(session_id = session.id(), "Order {} already placed", order.order_id);
                return Ok(order);
            }
            SessionStatus::Open => {}
            SessionStatus::Submitting | SessionStatus::Abandoned { .. } => {
                return Err(CofundError::SessionClosed(session.id().to_string()));
            }
        }

        let summary = session.summary().await;
        if !summary.all_items_funded {
            let unfunded = session
                .targets()
                .await
                .into_iter()
                .filter(|t| !t.is_complete)
                .map(|t| t.item_id)
                .collect();
            return Err(CofundError::CartNotFunded(unfunded));
        }

        {
            let mut status = session.status_lock().write().await;
            if !status.is_open() {
                return Err(CofundError::SessionClosed(session.id().to_string()));
            }
            *status = SessionStatus::Submitting;
        }

        let submission = match self.build_submission(session).await {
            Ok(submission) => submission,
            Err(e) => {
                session.set_status(SessionStatus::Open).await;
                return Err(e);
            }
        };

        match self.orders.submit(&submission).await {
            Ok(order) => {
                session.confirm_contributors().await;
                session
                    .set_status(SessionStatus::Placed { order: order.clone() })
                    .await;
                info!(
                    session_id = session.id(),
                    total = %order.total_amount,
                    "Placed order {}",
                    order.order_id
                );
                Ok(order)
            }
            Err(e) => {
                warn!(session_id = session.id(), "Order submission failed, session reopened: {}", e);
                session.set_status(SessionStatus::Open).await;
                Err(e)
            }
        }
    }

    /// Collects the order payload. Must run while the session is `Submitting` so
    /// assignments cannot change underneath it. Addresses are re-read from storage
    /// since they may have been deleted after selection.
    async fn build_submission(&self, session: &CheckoutSession) -> Result<OrderSubmission, CofundError> {
        let targets = session.targets().await;
        let unfunded: Vec<String> = targets
            .iter()
            .filter(|t| !t.is_complete)
            .map(|t| t.item_id.clone())
            .collect();
        if !unfunded.is_empty() {
            return Err(CofundError::CartNotFunded(unfunded));
        }

        let room_id = &session.room().id;
        let delivery_address = match session.delivery_address().await {
            Some(selected) => self.storage.get_address(room_id, &selected.id).await?,
            None => None,
        };
        let assignments_by_item = session.assignments_lock().read().await.clone();
        for item in session.items() {
            let resolved = match assignments_by_item.get(&item.id) {
                Some(assignment) => self
                    .storage
                    .get_address(room_id, &assignment.address_id)
                    .await?
                    .is_some(),
                None => delivery_address.is_some(),
            };
            if !resolved {
                return Err(CofundError::MissingDeliveryAddress(item.id.clone()));
            }
        }

        let assignments = session
            .items()
            .iter()
            .filter_map(|item| assignments_by_item.get(&item.id).cloned())
            .collect();
        let total_amount: Decimal = targets.iter().map(|t| t.target_amount).sum();

        Ok(OrderSubmission {
            session_id: session.id().to_string(),
            room_id: session.room().id.clone(),
            items: session.items().to_vec(),
            total_amount,
            contributors: session.contributors().await,
            assignments,
            delivery_address,
        })
    }
}
