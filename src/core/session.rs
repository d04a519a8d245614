use crate::core::errors::CofundError;
use crate::core::models::{
    address::DeliveryAddress,
    assignment::Assignment,
    cart::CartItem,
    contribution::{ContributionStatus, ContributionTarget, Contributor},
    room::Room,
    session::{
        CartSummary, CheckoutSnapshot, FundingProgress, ItemSnapshot, ItemState, OrphanedPledge, SessionStatus,
    },
};
use crate::core::tracker::FundingTargetTracker;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

/// Ledger state for a single cart item, guarded by its own mutex.
#[derive(Debug)]
pub(crate) struct ItemLedger {
    pub item: CartItem,
    pub target: ContributionTarget,
    pub contributors: Vec<Contributor>,
}

/// Aggregate root for one room's checkout.
///
/// Lock order is `cart_gate` → item ledgers (ascending item id) → `status`.
/// Nothing holds `status` for writing while waiting on an item ledger.
pub struct CheckoutSession {
    id: String,
    room: Room,
    items: Vec<CartItem>,
    ledgers: BTreeMap<String, Mutex<ItemLedger>>,
    assignments: RwLock<HashMap<String, Assignment>>,
    delivery_address: RwLock<Option<DeliveryAddress>>,
    status: RwLock<SessionStatus>,
    cart_gate: Mutex<()>,
    placement: Mutex<()>,
    funded_announced: AtomicBool,
    created_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn open(room: Room, items: Vec<CartItem>) -> Result<Self, CofundError> {
        if items.is_empty() {
            return Err(CofundError::invalid_input("items", "Empty Cart", "Cart must contain at least one item"));
        }
        let mut seen = HashSet::new();
        for item in &items {
            if item.id.trim().is_empty() {
                return Err(CofundError::invalid_input("items.id", "Invalid Item", "Item id cannot be empty"));
            }
            if !seen.insert(item.id.clone()) {
                return Err(CofundError::DuplicateItem(item.id.clone()));
            }
            if item.quantity == 0 {
                return Err(CofundError::invalid_input(
                    "items.quantity",
                    "Invalid Quantity",
                    format!("Quantity of item {} must be at least 1", item.id),
                ));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(CofundError::InvalidAmount(item.unit_price));
            }
        }

        let ledgers = items
            .iter()
            .map(|item| {
                (
                    item.id.clone(),
                    Mutex::new(ItemLedger {
                        item: item.clone(),
                        target: ContributionTarget::new(&item.id, item.target_amount()),
                        contributors: Vec::new(),
                    }),
                )
            })
            .collect();

        Ok(CheckoutSession {
            id: Uuid::new_v4().to_string(),
            room,
            items,
            ledgers,
            assignments: RwLock::new(HashMap::new()),
            delivery_address: RwLock::new(None),
            status: RwLock::new(SessionStatus::Open),
            cart_gate: Mutex::new(()),
            placement: Mutex::new(()),
            funded_announced: AtomicBool::new(false),
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub(crate) fn ledger(&self, item_id: &str) -> Result<&Mutex<ItemLedger>, CofundError> {
        self.ledgers
            .get(item_id)
            .ok_or_else(|| CofundError::ItemNotFound(item_id.to_string()))
    }

    /// Locks every item ledger in ascending item id order.
    pub(crate) async fn lock_all(&self) -> Vec<MutexGuard<'_, ItemLedger>> {
        let mut guards = Vec::with_capacity(self.ledgers.len());
        for ledger in self.ledgers.values() {
            guards.push(ledger.lock().await);
        }
        guards
    }

    pub(crate) fn cart_gate(&self) -> &Mutex<()> {
        &self.cart_gate
    }

    pub(crate) fn placement(&self) -> &Mutex<()> {
        &self.placement
    }

    pub(crate) fn status_lock(&self) -> &RwLock<SessionStatus> {
        &self.status
    }

    pub(crate) fn assignments_lock(&self) -> &RwLock<HashMap<String, Assignment>> {
        &self.assignments
    }

    pub(crate) fn delivery_address_lock(&self) -> &RwLock<Option<DeliveryAddress>> {
        &self.delivery_address
    }

    pub async fn status(&self) -> SessionStatus {
        self.status.read().await.clone()
    }

    pub(crate) async fn set_status(&self, status: SessionStatus) {
        *self.status.write().await = status;
    }

    pub async fn ensure_open(&self) -> Result<(), CofundError> {
        if self.status.read().await.is_open() {
            Ok(())
        } else {
            Err(CofundError::SessionClosed(self.id.clone()))
        }
    }

    pub async fn progress(&self, item_id: &str) -> Result<FundingProgress, CofundError> {
        let ledger = self.ledger(item_id)?.lock().await;
        Ok(FundingTargetTracker::progress(&ledger.target))
    }

    /// Targets in cart order. Each item is read under its own lock.
    pub async fn targets(&self) -> Vec<ContributionTarget> {
        let mut targets = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if let Some(ledger) = self.ledgers.get(&item.id) {
                targets.push(ledger.lock().await.target.clone());
            }
        }
        targets
    }

    pub async fn summary(&self) -> CartSummary {
        FundingTargetTracker::cart_summary(&self.targets().await)
    }

    pub async fn all_items_funded(&self) -> bool {
        self.summary().await.all_items_funded
    }

    /// Returns true exactly once, for the caller that first observes the cart fully funded.
    pub(crate) fn announce_fully_funded(&self) -> bool {
        !self.funded_announced.swap(true, Ordering::AcqRel)
    }

    pub async fn contributors(&self) -> Vec<Contributor> {
        let mut contributors = Vec::new();
        for item in &self.items {
            if let Some(ledger) = self.ledgers.get(&item.id) {
                contributors.extend(ledger.lock().await.contributors.iter().cloned());
            }
        }
        contributors
    }

    pub(crate) async fn confirm_contributors(&self) {
        for mut ledger in self.lock_all().await {
            for contributor in ledger.contributors.iter_mut() {
                contributor.confirm();
            }
        }
    }

    pub async fn assignment(&self, item_id: &str) -> Option<Assignment> {
        self.assignments.read().await.get(item_id).cloned()
    }

    pub async fn delivery_address(&self) -> Option<DeliveryAddress> {
        self.delivery_address.read().await.clone()
    }

    /// Marks the session abandoned. Contributed pledges stay in place for reconciliation.
    pub async fn abandon(&self) -> Result<DateTime<Utc>, CofundError> {
        let mut status = self.status.write().await;
        match &*status {
            SessionStatus::Open => {
                let abandoned_at = Utc::now();
                *status = SessionStatus::Abandoned { abandoned_at };
                Ok(abandoned_at)
            }
            SessionStatus::Abandoned { abandoned_at } => Ok(*abandoned_at),
            SessionStatus::Submitting | SessionStatus::Placed { .. } => Err(CofundError::SessionClosed(self.id.clone())),
        }
    }

    pub async fn orphaned_pledges(&self) -> Vec<OrphanedPledge> {
        let SessionStatus::Abandoned { abandoned_at } = self.status().await else {
            return Vec::new();
        };
        self.contributors()
            .await
            .into_iter()
            .filter(|c| c.status == ContributionStatus::Contributed)
            .map(|contributor| OrphanedPledge {
                session_id: self.id.clone(),
                room_id: self.room.id.clone(),
                contributor,
                abandoned_at,
            })
            .collect()
    }

    pub async fn snapshot(&self) -> CheckoutSnapshot {
        let status = self.status().await;
        let assignments = self.assignments.read().await.clone();
        let delivery_address = self.delivery_address().await;

        let mut items = Vec::with_capacity(self.items.len());
        let mut targets = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let Some(ledger) = self.ledgers.get(&item.id) else {
                continue;
            };
            let ledger = ledger.lock().await;
            let progress = FundingTargetTracker::progress(&ledger.target);
            let assignment = assignments.get(&item.id).cloned();
            let state = match (progress.is_complete, assignment.is_some()) {
                (false, _) => ItemState::Unfunded,
                (true, false) => ItemState::Funded,
                (true, true) => ItemState::Assigned,
            };
            targets.push(ledger.target.clone());
            items.push(ItemSnapshot {
                item: item.clone(),
                state,
                progress,
                contributors: ledger.contributors.clone(),
                assignment,
            });
        }

        let summary = FundingTargetTracker::cart_summary(&targets);
        let address_resolved = delivery_address.is_some() || items.iter().all(|i| i.assignment.is_some());
        CheckoutSnapshot {
            session_id: self.id.clone(),
            room_id: self.room.id.clone(),
            can_proceed_to_order: status.is_open() && summary.all_items_funded && address_resolved,
            all_items_funded: summary.all_items_funded,
            status,
            items,
            summary,
            delivery_address,
            created_at: self.created_at,
        }
    }
}
