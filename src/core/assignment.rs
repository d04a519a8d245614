use crate::core::errors::CofundError;
use crate::core::models::{address::DeliveryAddress, assignment::Assignment};
use crate::core::session::CheckoutSession;
use crate::infrastructure::storage::Storage;
use chrono::Utc;
use tracing::info;

/// Binds funded items to a receiving member and a delivery address.
pub struct AssignmentResolver<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> AssignmentResolver<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        AssignmentResolver { storage }
    }

    /// Replaces any earlier assignment for the item.
    pub async fn assign(
        &self,
        session: &CheckoutSession,
        item_id: &str,
        member_id: &str,
        address_id: &str,
    ) -> Result<Assignment, CofundError> {
        session.ensure_open().await?;
        if !session.progress(item_id).await?.is_complete {
            return Err(CofundError::ItemNotFunded(item_id.to_string()));
        }
        self.resolve_member(session, member_id).await?;
        self.resolve_address(session, address_id).await?;

        let assignment = Assignment {
            item_id: item_id.to_string(),
            member_id: member_id.to_string(),
            address_id: address_id.to_string(),
            assigned_at: Utc::now(),
        };

        let status = session.status_lock().read().await;
        if !status.is_open() {
            return Err(CofundError::SessionClosed(session.id().to_string()));
        }
        let previous = session
            .assignments_lock()
            .write()
            .await
            .insert(item_id.to_string(), assignment.clone());
        drop(status);

        info!(
            session_id = session.id(),
            item_id,
            "Assigned item to {} at {} (replaced: {})",
            member_id,
            address_id,
            previous.is_some()
        );
        Ok(assignment)
    }

    /// Removes the item's assignment, if any. Funding is untouched.
    pub async fn unassign(&self, session: &CheckoutSession, item_id: &str) -> Result<Option<Assignment>, CofundError> {
        session.ledger(item_id)?;
        let status = session.status_lock().read().await;
        if !status.is_open() {
            return Err(CofundError::SessionClosed(session.id().to_string()));
        }
        let removed = session.assignments_lock().write().await.remove(item_id);
        Ok(removed)
    }

    /// Sets one address for the whole order, used for items without an assignment.
    pub async fn select_delivery_address(
        &self,
        session: &CheckoutSession,
        address_id: &str,
    ) -> Result<DeliveryAddress, CofundError> {
        session.ensure_open().await?;
        let address = self.resolve_address(session, address_id).await?;

        let status = session.status_lock().read().await;
        if !status.is_open() {
            return Err(CofundError::SessionClosed(session.id().to_string()));
        }
        *session.delivery_address_lock().write().await = Some(address.clone());
        Ok(address)
    }

    async fn resolve_member(&self, session: &CheckoutSession, member_id: &str) -> Result<(), CofundError> {
        let members = self.storage.get_members(&session.room().id).await?;
        if members.iter().any(|m| m.user_id == member_id) {
            Ok(())
        } else {
            Err(CofundError::UnknownMember(member_id.to_string()))
        }
    }

    async fn resolve_address(&self, session: &CheckoutSession, address_id: &str) -> Result<DeliveryAddress, CofundError> {
        self.storage
            .get_address(&session.room().id, address_id)
            .await?
            .ok_or_else(|| CofundError::UnknownAddress(address_id.to_string()))
    }
}
