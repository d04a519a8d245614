mod cod_tests;
mod contribution_tests;

use crate::core::errors::CofundError;
use crate::core::models::{
    address::DeliveryAddress,
    cart::CartItem,
    contribution::{ContributionReceipt, ContributionRequest, PaymentMethod},
    room::{Role, Room, RoomMember},
};
use crate::core::services::{CheckoutService, NewAddress};
use crate::infrastructure::logging::{LoggingService, in_memory::InMemoryLogging};
use crate::infrastructure::orders::{OrderService, in_memory::InMemoryOrderService};
use crate::infrastructure::payment::{
    PaymentChannelAdapter, PaymentChannels, PaymentReceipt, PaymentRequest, cod::CashOnDeliveryChannel,
    collection_link::CollectionLinkChannel, wallet::WalletChannel,
};
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Barrier, Notify, Semaphore};
use uuid::Uuid;

pub type ServiceWith<L, O> = CheckoutService<L, InMemoryStorage, O>;
pub type TestService = ServiceWith<InMemoryLogging, InMemoryOrderService>;

pub fn money(amount: i64) -> Decimal {
    Decimal::from(amount)
}

pub fn default_channels(wallet: WalletChannel) -> PaymentChannels {
    PaymentChannels::new()
        .with(Arc::new(wallet))
        .with(Arc::new(CollectionLinkChannel::new("https://pay.test/collect")))
        .with(Arc::new(CashOnDeliveryChannel::new()))
}

pub fn create_test_service() -> TestService {
    create_test_service_with(default_channels(WalletChannel::new(money(10_000))))
}

pub fn create_test_service_with(channels: PaymentChannels) -> TestService {
    create_test_service_with_orders(InMemoryOrderService::new(), channels)
}

pub fn create_test_service_with_orders<O: OrderService>(
    orders: O,
    channels: PaymentChannels,
) -> ServiceWith<InMemoryLogging, O> {
    build_service(InMemoryLogging::new(), orders, channels)
}

pub fn create_test_service_with_logging<L: LoggingService>(logging: L) -> ServiceWith<L, InMemoryOrderService> {
    build_service(
        logging,
        InMemoryOrderService::new(),
        default_channels(WalletChannel::new(money(10_000))),
    )
}

fn build_service<L: LoggingService, O: OrderService>(
    logging: L,
    orders: O,
    channels: PaymentChannels,
) -> ServiceWith<L, O> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    CheckoutService::new(
        InMemoryStorage::new(),
        logging,
        orders,
        channels,
        "test-secret".to_string(),
        3600,
    )
}

/// Creates a room whose first listed user is the owner.
pub async fn create_room<L: LoggingService, O: OrderService>(service: &ServiceWith<L, O>, user_ids: &[&str]) -> Room {
    let members = user_ids
        .iter()
        .enumerate()
        .map(|(i, id)| RoomMember {
            user_id: id.to_string(),
            username: format!("{}-name", id),
            role: if i == 0 { Role::Owner } else { Role::Member },
        })
        .collect();
    service.create_room("ROOM42".to_string(), members).await.unwrap()
}

pub fn item(id: &str, unit_price: i64, quantity: u32) -> CartItem {
    CartItem {
        id: id.to_string(),
        name: format!("Product {}", id),
        unit_price: money(unit_price),
        quantity,
    }
}

pub async fn open_session<L: LoggingService, O: OrderService>(
    service: &ServiceWith<L, O>,
    room: &Room,
    items: Vec<CartItem>,
) -> String {
    service
        .open_session(&room.id, items, &room.members[0].user_id)
        .await
        .unwrap()
        .session_id
}

pub fn pay(method: PaymentMethod, item_id: Option<&str>, user_id: &str, amount: i64) -> ContributionRequest {
    ContributionRequest {
        item_id: item_id.map(String::from),
        user_id: user_id.to_string(),
        amount: money(amount),
        method,
    }
}

pub fn wallet(item_id: &str, user_id: &str, amount: i64) -> ContributionRequest {
    pay(PaymentMethod::Wallet, Some(item_id), user_id, amount)
}

pub async fn save_address<L: LoggingService, O: OrderService>(
    service: &ServiceWith<L, O>,
    room: &Room,
    city: &str,
) -> DeliveryAddress {
    service
        .save_address(
            &room.id,
            NewAddress {
                full_name: "Asha Rao".to_string(),
                phone: "+91 98450 00000".to_string(),
                line1: "12 MG Road".to_string(),
                line2: None,
                city: city.to_string(),
                state: "Karnataka".to_string(),
                postal_code: "560001".to_string(),
                country: "IN".to_string(),
                is_default: false,
            },
            &room.members[0].user_id,
        )
        .await
        .unwrap()
}

/// Payment channel whose behaviour is set per test.
pub struct ScriptedChannel {
    method: PaymentMethod,
    pub fail_pay: AtomicBool,
    pub fail_refund: AtomicBool,
    barrier: Option<Arc<Barrier>>,
    hold: Option<Semaphore>,
    /// Signalled each time a `pay` call starts.
    pub entered: Notify,
    pub paid: AtomicUsize,
    pub refunded: AtomicUsize,
}

impl ScriptedChannel {
    pub fn new(method: PaymentMethod) -> Self {
        ScriptedChannel {
            method,
            fail_pay: AtomicBool::new(false),
            fail_refund: AtomicBool::new(false),
            barrier: None,
            hold: None,
            entered: Notify::new(),
            paid: AtomicUsize::new(0),
            refunded: AtomicUsize::new(0),
        }
    }

    /// Holds every `pay` call until `parties` calls are in flight.
    pub fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Holds every `pay` call until the test calls `release`.
    pub fn held(mut self) -> Self {
        self.hold = Some(Semaphore::new(0));
        self
    }

    /// Lets one held `pay` call proceed.
    pub fn release(&self) {
        if let Some(hold) = &self.hold {
            hold.add_permits(1);
        }
    }
}

#[async_trait]
impl PaymentChannelAdapter for ScriptedChannel {
    fn method(&self) -> PaymentMethod {
        self.method
    }

    async fn pay(&self, request: &PaymentRequest) -> Result<PaymentReceipt, CofundError> {
        self.entered.notify_one();
        if let Some(hold) = &self.hold {
            hold.acquire().await.unwrap().forget();
        } else if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        } else {
            tokio::task::yield_now().await;
        }
        if self.fail_pay.load(Ordering::SeqCst) {
            return Err(CofundError::PaymentChannel("provider unavailable".to_string()));
        }
        self.paid.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentReceipt {
            transaction_id: format!("test_{}", Uuid::new_v4().simple()),
            payer_id: request.payer_id.clone(),
            amount: request.amount,
        })
    }

    async fn refund(&self, _receipt: &PaymentReceipt) -> Result<(), CofundError> {
        if self.fail_refund.load(Ordering::SeqCst) {
            return Err(CofundError::PaymentChannel("refund rejected".to_string()));
        }
        self.refunded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
