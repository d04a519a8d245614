pub mod cod;
pub mod collection_link;
pub mod wallet;

use crate::core::errors::CofundError;
use crate::core::models::contribution::PaymentMethod;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct PaymentRequest {
    pub payer_id: String,
    pub amount: Decimal,
    /// `None` for cart-wide payments.
    pub item_id: Option<String>,
    pub room_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub payer_id: String,
    pub amount: Decimal,
}

/// Uniform boundary to one external payment provider.
#[async_trait]
pub trait PaymentChannelAdapter: Send + Sync {
    fn method(&self) -> PaymentMethod;

    async fn pay(&self, request: &PaymentRequest) -> Result<PaymentReceipt, CofundError>;

    /// Returns money moved by `pay` when the ledger could not commit it.
    async fn refund(&self, receipt: &PaymentReceipt) -> Result<(), CofundError>;
}

/// The set of payment methods a deployment offers, one adapter per method.
#[derive(Clone, Default)]
pub struct PaymentChannels {
    adapters: HashMap<PaymentMethod, Arc<dyn PaymentChannelAdapter>>,
}

impl PaymentChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, adapter: Arc<dyn PaymentChannelAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn register(&mut self, adapter: Arc<dyn PaymentChannelAdapter>) {
        self.adapters.insert(adapter.method(), adapter);
    }

    pub fn get(&self, method: PaymentMethod) -> Result<Arc<dyn PaymentChannelAdapter>, CofundError> {
        self.adapters
            .get(&method)
            .cloned()
            .ok_or_else(|| CofundError::PaymentChannel(format!("No payment channel configured for {}", method)))
    }

    pub fn methods(&self) -> Vec<PaymentMethod> {
        self.adapters.keys().copied().collect()
    }
}
