use crate::core::errors::CofundError;
use crate::core::models::contribution::{ContributionReceipt, ContributionRequest, Contributor, PaymentMethod};
use crate::core::models::room::RoomMember;
use crate::core::session::CheckoutSession;
use crate::infrastructure::payment::{PaymentChannelAdapter, PaymentChannels, PaymentReceipt, PaymentRequest};
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Authoritative record of pledges per cart item.
///
/// Payments are taken optimistically: the remaining amount is checked, the channel is
/// called with no lock held, and the amount is re-checked under the item lock before
/// committing. A payment that no longer fits is refunded through the same channel.
pub struct ContributionLedger {
    channels: PaymentChannels,
}

impl ContributionLedger {
    pub fn new(channels: PaymentChannels) -> Self {
        ContributionLedger { channels }
    }

    pub async fn contribute(
        &self,
        session: &CheckoutSession,
        request: &ContributionRequest,
    ) -> Result<ContributionReceipt, CofundError> {
        session.ensure_open().await?;
        validate_amount(request.amount)?;
        let member = session
            .room()
            .member(&request.user_id)
            .cloned()
            .ok_or_else(|| CofundError::UnknownMember(request.user_id.clone()))?;
        let adapter = self.channels.get(request.method)?;

        match request.method {
            PaymentMethod::Cod => {
                self.contribute_cash_on_delivery(session, adapter.as_ref(), &member, request.amount)
                    .await
            }
            PaymentMethod::Wallet | PaymentMethod::MultiPartyLink => {
                let item_id = request.item_id.as_deref().ok_or_else(|| {
                    CofundError::invalid_input("item_id", "Missing Item", "Item is required for this payment method")
                })?;
                self.contribute_to_item(session, adapter.as_ref(), &member, item_id, request)
                    .await
            }
        }
    }

    async fn contribute_to_item(
        &self,
        session: &CheckoutSession,
        adapter: &dyn PaymentChannelAdapter,
        member: &RoomMember,
        item_id: &str,
        request: &ContributionRequest,
    ) -> Result<ContributionReceipt, CofundError> {
        let ledger = session.ledger(item_id)?;
        {
            let guard = ledger.lock().await;
            check_fits(item_id, request.amount, guard.target.remaining_amount())?;
        }

        let pending = Contributor::pending(item_id, &member.user_id, &member.username, request.amount, request.method);
        let receipt = adapter
            .pay(&PaymentRequest {
                payer_id: member.user_id.clone(),
                amount: request.amount,
                item_id: Some(item_id.to_string()),
                room_id: session.room().id.clone(),
            })
            .await?;

        let mut guard = ledger.lock().await;
        let rejection = if !session.status_lock().read().await.is_open() {
            Some(CofundError::SessionClosed(session.id().to_string()))
        } else {
            check_fits(item_id, request.amount, guard.target.remaining_amount()).err()
        };
        if let Some(rejection) = rejection {
            drop(guard);
            return Err(self.compensate(adapter, &receipt, rejection).await);
        }

        let contributor = pending.contributed(&receipt.transaction_id);
        guard.target.commit(request.amount);
        guard.contributors.push(contributor.clone());
        info!(
            session_id = session.id(),
            item_id,
            amount = %request.amount,
            method = %request.method,
            "Committed contribution from {} ({} of {} funded)",
            member.user_id,
            guard.target.current_amount,
            guard.target.target_amount
        );
        drop(guard);

        Ok(ContributionReceipt {
            transaction_id: receipt.transaction_id,
            payment_method: request.method,
            contributors: vec![contributor],
            all_items_funded: session.all_items_funded().await,
        })
    }

    /// Cash on delivery closes out the whole remaining cart in one call and is only
    /// offered to single-member rooms.
    async fn contribute_cash_on_delivery(
        &self,
        session: &CheckoutSession,
        adapter: &dyn PaymentChannelAdapter,
        member: &RoomMember,
        amount: Decimal,
    ) -> Result<ContributionReceipt, CofundError> {
        let room = session.room();
        if !room.is_single_payer() {
            return Err(CofundError::CodNotAllowed(format!(
                "room {} has {} members; cash on delivery requires a single payer",
                room.id,
                room.member_count()
            )));
        }

        let _gate = session.cart_gate().lock().await;
        let remaining = session.summary().await.total_remaining;
        if amount != remaining {
            return Err(CofundError::CodNotAllowed(format!(
                "amount {} must equal the remaining cart total {}",
                amount, remaining
            )));
        }

        let receipt = adapter
            .pay(&PaymentRequest {
                payer_id: member.user_id.clone(),
                amount,
                item_id: None,
                room_id: room.id.clone(),
            })
            .await?;

        let mut guards = session.lock_all().await;
        let remaining: Decimal = guards.iter().map(|g| g.target.remaining_amount()).sum();
        let rejection = if !session.status_lock().read().await.is_open() {
            Some(CofundError::SessionClosed(session.id().to_string()))
        } else if remaining != amount {
            Some(CofundError::CodNotAllowed(format!(
                "cart changed while paying; remaining total is now {}",
                remaining
            )))
        } else {
            None
        };
        if let Some(rejection) = rejection {
            drop(guards);
            return Err(self.compensate(adapter, &receipt, rejection).await);
        }

        let mut contributors = Vec::new();
        for guard in guards.iter_mut() {
            let share = guard.target.remaining_amount();
            if share <= Decimal::ZERO {
                continue;
            }
            let contributor = Contributor::pending(&guard.item.id, &member.user_id, &member.username, share, PaymentMethod::Cod)
                .contributed(&receipt.transaction_id);
            guard.target.commit(share);
            guard.contributors.push(contributor.clone());
            contributors.push(contributor);
        }
        drop(guards);
        // ledgers lock in id order; report in cart order
        contributors.sort_by_key(|c| session.items().iter().position(|item| item.id == c.item_id));

        info!(
            session_id = session.id(),
            amount = %amount,
            "Cash on delivery covered {} items for {}",
            contributors.len(),
            member.user_id
        );
        Ok(ContributionReceipt {
            transaction_id: receipt.transaction_id,
            payment_method: PaymentMethod::Cod,
            contributors,
            all_items_funded: session.all_items_funded().await,
        })
    }

    /// Refunds a payment that could not be committed. Returns the error to surface:
    /// the original rejection, or `CompensationFailure` when the refund itself failed.
    async fn compensate(
        &self,
        adapter: &dyn PaymentChannelAdapter,
        receipt: &PaymentReceipt,
        rejection: CofundError,
    ) -> CofundError {
        warn!(
            "Refunding transaction {} ({}) after commit was rejected: {}",
            receipt.transaction_id, receipt.amount, rejection
        );
        match adapter.refund(receipt).await {
            Ok(()) => rejection,
            Err(e) => {
                error!(
                    "Refund of transaction {} ({}) failed: {}",
                    receipt.transaction_id, receipt.amount, e
                );
                CofundError::CompensationFailure {
                    incident_id: Uuid::new_v4().to_string(),
                    transaction_id: receipt.transaction_id.clone(),
                    amount: receipt.amount,
                    reason: format!("{}; refund failed: {}", rejection, e),
                }
            }
        }
    }
}

fn validate_amount(amount: Decimal) -> Result<(), CofundError> {
    if amount <= Decimal::ZERO || amount.normalize().scale() > 2 {
        return Err(CofundError::InvalidAmount(amount));
    }
    Ok(())
}

fn check_fits(item_id: &str, amount: Decimal, remaining: Decimal) -> Result<(), CofundError> {
    if amount > remaining {
        return Err(CofundError::Overfunding {
            item_id: item_id.to_string(),
            requested: amount,
            remaining,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(Decimal::new(1050, 2)).is_ok());
        assert!(validate_amount(Decimal::new(10500, 3)).is_ok());
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(Decimal::from(-5)).is_err());
        assert!(validate_amount(Decimal::new(1001, 3)).is_err());
    }
}
