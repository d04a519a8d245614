use crate::auth::jwt::{Claims, JwtService};
use crate::constants::{
    ADDRESS_DELETED, ADDRESS_SAVED, ALL_ITEMS_FUNDED, COMPENSATION_FAILED, CONTRIBUTION_COMMITTED,
    CONTRIBUTION_REJECTED, DELIVERY_ADDRESS_SELECTED, ITEM_ASSIGNED, ITEM_UNASSIGNED, MEMBER_TOKEN_ISSUED,
    ORDER_PLACED, ORDER_SUBMISSION_FAILED, ROOM_CREATED, SESSION_ABANDONED, SESSION_OPENED,
};
use crate::core::assignment::AssignmentResolver;
use crate::core::coordinator::OrderPlacementCoordinator;
use crate::core::errors::{CofundError, ErrorKind};
use crate::core::ledger::ContributionLedger;
use crate::core::models::{
    address::DeliveryAddress,
    assignment::Assignment,
    audit::{AppLog, Incident, SessionAudit},
    cart::CartItem,
    contribution::{ContributionReceipt, ContributionRequest},
    order::OrderReference,
    room::{Role, Room, RoomMember},
    session::{CartSummary, CheckoutSnapshot, FundingProgress, OrphanedPledge},
};
use crate::core::session::CheckoutSession;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::orders::OrderService;
use crate::infrastructure::payment::PaymentChannels;
use crate::infrastructure::storage::Storage;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Address fields supplied by a member; the id and room are assigned by the service.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NewAddress {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

pub struct CheckoutService<L: LoggingService, S: Storage, O: OrderService> {
    storage: S,
    logging: L,
    orders: O,
    ledger: ContributionLedger,
    sessions: RwLock<HashMap<String, Arc<CheckoutSession>>>,
    jwt_service: JwtService,
}

impl<L: LoggingService, S: Storage, O: OrderService> CheckoutService<L, S, O> {
    pub fn new(
        storage: S,
        logging: L,
        orders: O,
        channels: PaymentChannels,
        jwt_secret: String,
        token_ttl_secs: u64,
    ) -> Self {
        CheckoutService {
            storage,
            logging,
            orders,
            ledger: ContributionLedger::new(channels),
            sessions: RwLock::new(HashMap::new()),
            jwt_service: JwtService::new(jwt_secret, token_ttl_secs),
        }
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, CofundError> {
        self.jwt_service.validate_token(token)
    }

    async fn log_and_audit(
        &self,
        room_id: &str,
        session_id: Option<&str>,
        action: &str,
        log_details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), CofundError> {
        self.logging
            .log_action(action, Some(room_id), log_details.clone(), user_id)
            .await?;
        if let Some(sid) = session_id {
            self.storage
                .save_session_audit(SessionAudit {
                    id: Uuid::new_v4().to_string(),
                    session_id: sid.to_string(),
                    action: action.to_string(),
                    user_id: user_id.map(String::from),
                    details: log_details,
                    timestamp: Utc::now(),
                })
                .await?;
        }
        Ok(())
    }

    /// Audit whose failure must not replace the outcome the caller sees. A committed
    /// payment or placed order reported as an error would invite a paying retry.
    async fn record_outcome(
        &self,
        room_id: &str,
        session_id: &str,
        action: &str,
        log_details: serde_json::Value,
        user_id: Option<&str>,
    ) {
        if let Err(e) = self
            .log_and_audit(room_id, Some(session_id), action, log_details, user_id)
            .await
        {
            error!(session_id, action, "Failed to record audit entry: {}", e);
        }
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), CofundError> {
        if value.trim().is_empty() {
            return Err(CofundError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.len() > max_length {
            return Err(CofundError::invalid_input(
                field,
                &format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(CofundError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Arc<CheckoutSession>, CofundError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| CofundError::SessionNotFound(session_id.to_string()))
    }

    async fn require_room(&self, room_id: &str) -> Result<Room, CofundError> {
        self.storage
            .get_room(room_id)
            .await?
            .ok_or_else(|| CofundError::RoomNotFound(room_id.to_string()))
    }

    /// Session scoped to the caller's room; sessions of other rooms are reported as missing.
    pub async fn session_for(&self, session_id: &str, room_id: &str) -> Result<Arc<CheckoutSession>, CofundError> {
        let session = self.get_session(session_id).await?;
        if session.room().id != room_id {
            return Err(CofundError::SessionNotFound(session_id.to_string()));
        }
        Ok(session)
    }

    // --- rooms & members -------------------------------------------------

    pub async fn create_room(&self, code: String, members: Vec<RoomMember>) -> Result<Room, CofundError> {
        self.validate_string_input("code", &code, 32)?;
        if members.is_empty() {
            return Err(CofundError::invalid_input(
                "members",
                "Invalid members",
                "A room needs at least one member",
            ));
        }
        let mut seen = HashSet::new();
        for member in &members {
            self.validate_string_input("user_id", &member.user_id, 64)?;
            self.validate_string_input("username", &member.username, 100)?;
            if !seen.insert(member.user_id.as_str()) {
                return Err(CofundError::invalid_input(
                    "members",
                    "Duplicate member",
                    format!("User {} is listed twice", member.user_id),
                ));
            }
        }
        let owners = members.iter().filter(|m| m.role == Role::Owner).count();
        if owners != 1 {
            return Err(CofundError::invalid_input(
                "members",
                "Invalid owner count",
                format!("A room needs exactly one owner, found {}", owners),
            ));
        }

        let room = Room {
            id: Uuid::new_v4().to_string(),
            code,
            members,
        };
        self.storage.save_room(room.clone()).await?;
        self.log_and_audit(
            &room.id,
            None,
            ROOM_CREATED,
            json!({
                "room_id": room.id,
                "member_ids": room.members.iter().map(|m| m.user_id.clone()).collect::<Vec<_>>()
            }),
            None,
        )
        .await?;
        Ok(room)
    }

    pub async fn get_room(&self, room_id: &str) -> Result<Room, CofundError> {
        self.require_room(room_id).await
    }

    /// The room code is the shared secret members use to join.
    pub async fn issue_member_token(&self, room_id: &str, user_id: &str, code: &str) -> Result<String, CofundError> {
        let room = self.require_room(room_id).await?;
        if room.code != code {
            warn!(room_id, user_id, "Rejected login with wrong room code");
            return Err(CofundError::Unauthorized("Invalid room code".to_string()));
        }
        if room.member(user_id).is_none() {
            return Err(CofundError::UnknownMember(user_id.to_string()));
        }
        let token = self.jwt_service.generate_token(user_id, room_id)?;
        self.log_and_audit(room_id, None, MEMBER_TOKEN_ISSUED, json!({ "room_id": room_id }), Some(user_id))
            .await?;
        Ok(token)
    }

    // --- address store ---------------------------------------------------

    pub async fn save_address(
        &self,
        room_id: &str,
        address: NewAddress,
        saved_by: &str,
    ) -> Result<DeliveryAddress, CofundError> {
        self.require_room(room_id).await?;
        self.validate_string_input("full_name", &address.full_name, 100)?;
        self.validate_string_input("phone", &address.phone, 20)?;
        self.validate_string_input("line1", &address.line1, 200)?;
        if let Some(line2) = address.line2.as_deref().filter(|l| !l.is_empty()) {
            self.validate_string_input("line2", line2, 200)?;
        }
        self.validate_string_input("city", &address.city, 100)?;
        self.validate_string_input("state", &address.state, 100)?;
        self.validate_string_input("postal_code", &address.postal_code, 12)?;
        self.validate_string_input("country", &address.country, 100)?;

        let first = self.storage.get_addresses(room_id).await?.is_empty();
        let address = DeliveryAddress {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            full_name: address.full_name,
            phone: address.phone,
            line1: address.line1,
            line2: address.line2,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            country: address.country,
            is_default: address.is_default || first,
        };
        self.storage.save_address(address.clone()).await?;
        self.log_and_audit(
            room_id,
            None,
            ADDRESS_SAVED,
            json!({ "room_id": room_id, "address_id": address.id, "is_default": address.is_default }),
            Some(saved_by),
        )
        .await?;
        Ok(address)
    }

    pub async fn list_addresses(&self, room_id: &str) -> Result<Vec<DeliveryAddress>, CofundError> {
        self.storage.get_addresses(room_id).await
    }

    pub async fn delete_address(&self, room_id: &str, address_id: &str, deleted_by: &str) -> Result<(), CofundError> {
        if !self.storage.delete_address(room_id, address_id).await? {
            return Err(CofundError::UnknownAddress(address_id.to_string()));
        }
        self.log_and_audit(
            room_id,
            None,
            ADDRESS_DELETED,
            json!({ "room_id": room_id, "address_id": address_id }),
            Some(deleted_by),
        )
        .await
    }

    // --- checkout sessions -----------------------------------------------

    pub async fn open_session(
        &self,
        room_id: &str,
        items: Vec<CartItem>,
        opened_by: &str,
    ) -> Result<CheckoutSnapshot, CofundError> {
        let room = self.require_room(room_id).await?;
        for item in &items {
            self.validate_string_input("name", &item.name, 200)?;
        }
        let session = Arc::new(CheckoutSession::open(room, items)?);
        let snapshot = session.snapshot().await;
        self.sessions
            .write()
            .await
            .insert(session.id().to_string(), session.clone());

        info!(
            session_id = session.id(),
            room_id,
            "Opened checkout for {} items totalling {}",
            snapshot.summary.total_items,
            snapshot.summary.total_target
        );
        self.log_and_audit(
            room_id,
            Some(session.id()),
            SESSION_OPENED,
            json!({
                "session_id": session.id(),
                "room_id": room_id,
                "item_ids": session.items().iter().map(|i| i.id.clone()).collect::<Vec<_>>(),
                "total_target": snapshot.summary.total_target
            }),
            Some(opened_by),
        )
        .await?;
        Ok(snapshot)
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<CheckoutSnapshot, CofundError> {
        Ok(self.get_session(session_id).await?.snapshot().await)
    }

    pub async fn progress(&self, session_id: &str, item_id: &str) -> Result<FundingProgress, CofundError> {
        self.get_session(session_id).await?.progress(item_id).await
    }

    pub async fn cart_summary(&self, session_id: &str) -> Result<CartSummary, CofundError> {
        Ok(self.get_session(session_id).await?.summary().await)
    }

    pub async fn contribute(
        &self,
        session_id: &str,
        request: ContributionRequest,
    ) -> Result<ContributionReceipt, CofundError> {
        let session = self.get_session(session_id).await?;
        let room_id = session.room().id.as_str();
        let receipt = match self.ledger.contribute(&session, &request).await {
            Ok(receipt) => receipt,
            Err(e) => {
                if let CofundError::CompensationFailure {
                    incident_id,
                    transaction_id,
                    amount,
                    reason,
                } = &e
                {
                    self.report_incident(Incident {
                        id: incident_id.clone(),
                        room_id: room_id.to_string(),
                        session_id: session_id.to_string(),
                        item_id: request.item_id.clone(),
                        transaction_id: transaction_id.clone(),
                        amount: *amount,
                        reason: reason.clone(),
                        timestamp: Utc::now(),
                    })
                    .await;
                } else if matches!(e.kind(), ErrorKind::Overfunding | ErrorKind::PaymentChannel) {
                    warn!(session_id, user_id = request.user_id.as_str(), "Contribution rejected: {}", e);
                    self.record_outcome(
                        room_id,
                        session_id,
                        CONTRIBUTION_REJECTED,
                        json!({
                            "item_id": request.item_id,
                            "amount": request.amount,
                            "method": request.method,
                            "reason": e.to_string()
                        }),
                        Some(request.user_id.as_str()),
                    )
                    .await;
                }
                return Err(e);
            }
        };

        self.record_outcome(
            room_id,
            session_id,
            CONTRIBUTION_COMMITTED,
            json!({
                "transaction_id": receipt.transaction_id,
                "method": receipt.payment_method,
                "amount": request.amount,
                "item_ids": receipt.contributors.iter().map(|c| c.item_id.clone()).collect::<Vec<_>>()
            }),
            Some(request.user_id.as_str()),
        )
        .await;

        if receipt.all_items_funded && session.announce_fully_funded() {
            info!(session_id, "All items funded");
            self.record_outcome(room_id, session_id, ALL_ITEMS_FUNDED, json!({ "session_id": session_id }), None)
                .await;
        }
        Ok(receipt)
    }

    /// Compensation failures are operator incidents: they are persisted and logged at
    /// error level even if the audit trail itself is unavailable.
    async fn report_incident(&self, incident: Incident) {
        error!(
            incident_id = incident.id.as_str(),
            session_id = incident.session_id.as_str(),
            transaction_id = incident.transaction_id.as_str(),
            amount = %incident.amount,
            "Manual reconciliation required: {}",
            incident.reason
        );
        let details = json!({
            "incident_id": incident.id,
            "transaction_id": incident.transaction_id,
            "amount": incident.amount,
            "reason": incident.reason
        });
        let room_id = incident.room_id.clone();
        let session_id = incident.session_id.clone();
        if let Err(e) = self.storage.save_incident(incident).await {
            error!("Failed to persist incident: {}", e);
        }
        self.record_outcome(&room_id, &session_id, COMPENSATION_FAILED, details, None)
            .await;
    }

    pub async fn assign(
        &self,
        session_id: &str,
        item_id: &str,
        member_id: &str,
        address_id: &str,
        assigned_by: &str,
    ) -> Result<Assignment, CofundError> {
        let session = self.get_session(session_id).await?;
        let assignment = AssignmentResolver::new(&self.storage)
            .assign(&session, item_id, member_id, address_id)
            .await?;
        self.log_and_audit(
            &session.room().id,
            Some(session_id),
            ITEM_ASSIGNED,
            json!({ "item_id": item_id, "member_id": member_id, "address_id": address_id }),
            Some(assigned_by),
        )
        .await?;
        Ok(assignment)
    }

    pub async fn unassign(&self, session_id: &str, item_id: &str, unassigned_by: &str) -> Result<(), CofundError> {
        let session = self.get_session(session_id).await?;
        let removed = AssignmentResolver::new(&self.storage)
            .unassign(&session, item_id)
            .await?;
        self.log_and_audit(
            &session.room().id,
            Some(session_id),
            ITEM_UNASSIGNED,
            json!({ "item_id": item_id, "had_assignment": removed.is_some() }),
            Some(unassigned_by),
        )
        .await
    }

    pub async fn select_delivery_address(
        &self,
        session_id: &str,
        address_id: &str,
        selected_by: &str,
    ) -> Result<DeliveryAddress, CofundError> {
        let session = self.get_session(session_id).await?;
        let address = AssignmentResolver::new(&self.storage)
            .select_delivery_address(&session, address_id)
            .await?;
        self.log_and_audit(
            &session.room().id,
            Some(session_id),
            DELIVERY_ADDRESS_SELECTED,
            json!({ "address_id": address_id }),
            Some(selected_by),
        )
        .await?;
        Ok(address)
    }

    pub async fn place_order(&self, session_id: &str, placed_by: &str) -> Result<OrderReference, CofundError> {
        let session = self.get_session(session_id).await?;
        let room_id = session.room().id.as_str();
        match OrderPlacementCoordinator::new(&self.orders, &self.storage)
            .place_order(&session)
            .await
        {
            Ok(order) => {
                self.record_outcome(
                    room_id,
                    session_id,
                    ORDER_PLACED,
                    json!({ "order_id": order.order_id, "total_amount": order.total_amount }),
                    Some(placed_by),
                )
                .await;
                Ok(order)
            }
            Err(e) => {
                if e.kind() == ErrorKind::Upstream {
                    self.record_outcome(
                        room_id,
                        session_id,
                        ORDER_SUBMISSION_FAILED,
                        json!({ "reason": e.to_string() }),
                        Some(placed_by),
                    )
                    .await;
                }
                Err(e)
            }
        }
    }

    pub async fn abandon_session(&self, session_id: &str, abandoned_by: &str) -> Result<CheckoutSnapshot, CofundError> {
        let session = self.get_session(session_id).await?;
        let abandoned_at = session.abandon().await?;
        let orphaned = session.orphaned_pledges().await;
        if !orphaned.is_empty() {
            warn!(session_id, "Session abandoned with {} outstanding pledges", orphaned.len());
        }
        self.record_outcome(
            &session.room().id,
            session_id,
            SESSION_ABANDONED,
            json!({ "abandoned_at": abandoned_at, "orphaned_pledges": orphaned.len() }),
            Some(abandoned_by),
        )
        .await;
        Ok(session.snapshot().await)
    }

    /// Contributed pledges in the room's abandoned sessions, for provider-side reconciliation.
    pub async fn orphaned_pledges(&self, room_id: &str) -> Vec<OrphanedPledge> {
        let sessions: Vec<Arc<CheckoutSession>> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|session| session.room().id == room_id)
            .cloned()
            .collect();
        futures::future::join_all(sessions.iter().map(|session| session.orphaned_pledges()))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    pub async fn get_incidents(&self, room_id: &str) -> Result<Vec<Incident>, CofundError> {
        let incidents = self.storage.get_incidents().await?;
        Ok(incidents.into_iter().filter(|i| i.room_id == room_id).collect())
    }

    pub async fn get_app_logs(&self, room_id: &str) -> Result<Vec<AppLog>, CofundError> {
        let logs = self.logging.get_logs().await?;
        Ok(logs
            .into_iter()
            .filter(|log| log.room_id.as_deref() == Some(room_id))
            .collect())
    }

    pub async fn get_session_audits(&self, session_id: &str) -> Result<Vec<SessionAudit>, CofundError> {
        self.get_session(session_id).await?;
        self.storage.get_session_audits(session_id).await
    }
}
