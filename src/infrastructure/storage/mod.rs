use crate::core::errors::CofundError;
use crate::core::models::{
    address::DeliveryAddress,
    audit::{Incident, SessionAudit},
    room::{Room, RoomMember},
};
use async_trait::async_trait;

/// Room membership and address store, plus the audit and incident trails.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn save_room(&self, room: Room) -> Result<(), CofundError>;
    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, CofundError>;
    async fn get_members(&self, room_id: &str) -> Result<Vec<RoomMember>, CofundError>;
    async fn save_address(&self, address: DeliveryAddress) -> Result<(), CofundError>;
    async fn get_address(&self, room_id: &str, address_id: &str) -> Result<Option<DeliveryAddress>, CofundError>;
    async fn get_addresses(&self, room_id: &str) -> Result<Vec<DeliveryAddress>, CofundError>;
    async fn delete_address(&self, room_id: &str, address_id: &str) -> Result<bool, CofundError>;
    async fn save_session_audit(&self, audit: SessionAudit) -> Result<(), CofundError>;
    async fn get_session_audits(&self, session_id: &str) -> Result<Vec<SessionAudit>, CofundError>;
    async fn save_incident(&self, incident: Incident) -> Result<(), CofundError>;
    async fn get_incidents(&self) -> Result<Vec<Incident>, CofundError>;
}

pub mod in_memory;
