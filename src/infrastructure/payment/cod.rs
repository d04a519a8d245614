use crate::core::errors::CofundError;
use crate::core::models::contribution::PaymentMethod;
use crate::infrastructure::payment::{PaymentChannelAdapter, PaymentReceipt, PaymentRequest};
use async_trait::async_trait;
use uuid::Uuid;

/// Cash on delivery marker. No money moves at checkout, so `pay` always succeeds
/// and `refund` only voids the marker.
#[derive(Clone, Default)]
pub struct CashOnDeliveryChannel;

impl CashOnDeliveryChannel {
    pub fn new() -> Self {
        CashOnDeliveryChannel
    }
}

#[async_trait]
impl PaymentChannelAdapter for CashOnDeliveryChannel {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Cod
    }

    async fn pay(&self, request: &PaymentRequest) -> Result<PaymentReceipt, CofundError> {
        Ok(PaymentReceipt {
            transaction_id: format!("cod_{}", Uuid::new_v4().simple()),
            payer_id: request.payer_id.clone(),
            amount: request.amount,
        })
    }

    async fn refund(&self, _receipt: &PaymentReceipt) -> Result<(), CofundError> {
        Ok(())
    }
}
