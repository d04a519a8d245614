use crate::core::errors::CofundError;
use crate::core::models::contribution::PaymentMethod;
use crate::infrastructure::payment::{PaymentChannelAdapter, PaymentReceipt, PaymentRequest};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// In-process wallet provider. Accounts open on first use with `opening_balance`.
#[derive(Clone)]
pub struct WalletChannel {
    balances: Arc<RwLock<HashMap<String, Decimal>>>,
    opening_balance: Decimal,
}

impl WalletChannel {
    pub fn new(opening_balance: Decimal) -> Self {
        WalletChannel {
            balances: Arc::new(RwLock::new(HashMap::new())),
            opening_balance,
        }
    }

    pub async fn credit(&self, user_id: &str, amount: Decimal) -> Decimal {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(user_id.to_string()).or_insert(self.opening_balance);
        *balance += amount;
        *balance
    }

    pub async fn balance(&self, user_id: &str) -> Decimal {
        let balances = self.balances.read().await;
        balances.get(user_id).copied().unwrap_or(self.opening_balance)
    }
}

#[async_trait]
impl PaymentChannelAdapter for WalletChannel {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Wallet
    }

    async fn pay(&self, request: &PaymentRequest) -> Result<PaymentReceipt, CofundError> {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(request.payer_id.clone()).or_insert(self.opening_balance);
        if *balance < request.amount {
            return Err(CofundError::PaymentChannel(format!(
                "Insufficient wallet balance for {}: {} < {}",
                request.payer_id, balance, request.amount
            )));
        }
        *balance -= request.amount;
        debug!("Debited {} from wallet of {}", request.amount, request.payer_id);
        Ok(PaymentReceipt {
            transaction_id: format!("wal_{}", Uuid::new_v4().simple()),
            payer_id: request.payer_id.clone(),
            amount: request.amount,
        })
    }

    async fn refund(&self, receipt: &PaymentReceipt) -> Result<(), CofundError> {
        let balance = self.credit(&receipt.payer_id, receipt.amount).await;
        debug!(
            "Refunded {} to wallet of {} (txn {}), balance now {}",
            receipt.amount, receipt.payer_id, receipt.transaction_id, balance
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(payer: &str, amount: i64) -> PaymentRequest {
        PaymentRequest {
            payer_id: payer.to_string(),
            amount: Decimal::from(amount),
            item_id: Some("i1".to_string()),
            room_id: "r1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_debit_and_refund() {
        let wallet = WalletChannel::new(Decimal::from(500));
        let receipt = wallet.pay(&request("u1", 200)).await.unwrap();
        assert_eq!(wallet.balance("u1").await, Decimal::from(300));
        wallet.refund(&receipt).await.unwrap();
        assert_eq!(wallet.balance("u1").await, Decimal::from(500));
    }

    #[tokio::test]
    async fn test_insufficient_balance_leaves_wallet_untouched() {
        let wallet = WalletChannel::new(Decimal::from(100));
        let result = wallet.pay(&request("u1", 200)).await;
        assert!(matches!(result, Err(CofundError::PaymentChannel(_))));
        assert_eq!(wallet.balance("u1").await, Decimal::from(100));
    }
}
