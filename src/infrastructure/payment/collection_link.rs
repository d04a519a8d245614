use crate::core::errors::CofundError;
use crate::core::models::contribution::PaymentMethod;
use crate::infrastructure::payment::{PaymentChannelAdapter, PaymentReceipt, PaymentRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkState {
    Active,
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct CollectionLink {
    pub transaction_id: String,
    pub url: String,
    pub room_id: String,
    pub item_id: Option<String>,
    pub amount: Decimal,
    pub state: LinkState,
    pub created_at: DateTime<Utc>,
}

/// Creates shareable multi-party collection links. The link reference is the transaction id.
#[derive(Clone)]
pub struct CollectionLinkChannel {
    base_url: String,
    links: Arc<RwLock<HashMap<String, CollectionLink>>>,
}

impl CollectionLinkChannel {
    pub fn new(base_url: impl Into<String>) -> Self {
        CollectionLinkChannel {
            base_url: base_url.into(),
            links: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn link(&self, transaction_id: &str) -> Option<CollectionLink> {
        self.links.read().await.get(transaction_id).cloned()
    }
}

#[async_trait]
impl PaymentChannelAdapter for CollectionLinkChannel {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::MultiPartyLink
    }

    async fn pay(&self, request: &PaymentRequest) -> Result<PaymentReceipt, CofundError> {
        let transaction_id = format!("lnk_{}", Uuid::new_v4().simple());
        let link = CollectionLink {
            transaction_id: transaction_id.clone(),
            url: format!("{}/{}/{}", self.base_url.trim_end_matches('/'), request.room_id, transaction_id),
            room_id: request.room_id.clone(),
            item_id: request.item_id.clone(),
            amount: request.amount,
            state: LinkState::Active,
            created_at: Utc::now(),
        };
        debug!("Created collection link {} for {}", link.url, request.amount);
        self.links.write().await.insert(transaction_id.clone(), link);
        Ok(PaymentReceipt {
            transaction_id,
            payer_id: request.payer_id.clone(),
            amount: request.amount,
        })
    }

    async fn refund(&self, receipt: &PaymentReceipt) -> Result<(), CofundError> {
        let mut links = self.links.write().await;
        let link = links.get_mut(&receipt.transaction_id).ok_or_else(|| {
            CofundError::PaymentChannel(format!("Collection link {} not found", receipt.transaction_id))
        })?;
        if link.state == LinkState::Cancelled {
            warn!("Collection link {} already cancelled", receipt.transaction_id);
        }
        link.state = LinkState::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refund_cancels_the_link() {
        let channel = CollectionLinkChannel::new("https://pay.test/collect/");
        let receipt = channel
            .pay(&PaymentRequest {
                payer_id: "u1".to_string(),
                amount: Decimal::from(250),
                item_id: Some("i1".to_string()),
                room_id: "r1".to_string(),
            })
            .await
            .unwrap();

        let link = channel.link(&receipt.transaction_id).await.unwrap();
        assert_eq!(link.state, LinkState::Active);
        assert_eq!(link.url, format!("https://pay.test/collect/r1/{}", receipt.transaction_id));

        channel.refund(&receipt).await.unwrap();
        assert_eq!(channel.link(&receipt.transaction_id).await.unwrap().state, LinkState::Cancelled);
    }
}
