use crate::core::errors::CofundError;
use crate::core::models::{
    address::DeliveryAddress,
    audit::{Incident, SessionAudit},
    room::{Room, RoomMember},
};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct InMemoryStorage {
    rooms: Arc<RwLock<HashMap<String, Room>>>,
    // room id -> addresses in insertion order
    addresses: Arc<RwLock<HashMap<String, Vec<DeliveryAddress>>>>,
    session_audits: Arc<RwLock<HashMap<String, Vec<SessionAudit>>>>,
    incidents: Arc<RwLock<Vec<Incident>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            addresses: Arc::new(RwLock::new(HashMap::new())),
            session_audits: Arc::new(RwLock::new(HashMap::new())),
            incidents: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_room(&self, room: Room) -> Result<(), CofundError> {
        let mut rooms = self.rooms.write().await;
        rooms.insert(room.id.clone(), room);
        Ok(())
    }

    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, CofundError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(room_id).cloned())
    }

    async fn get_members(&self, room_id: &str) -> Result<Vec<RoomMember>, CofundError> {
        let rooms = self.rooms.read().await;
        rooms
            .get(room_id)
            .map(|r| r.members.clone())
            .ok_or_else(|| CofundError::RoomNotFound(room_id.to_string()))
    }

    async fn save_address(&self, address: DeliveryAddress) -> Result<(), CofundError> {
        let mut addresses = self.addresses.write().await;
        let room_addresses = addresses.entry(address.room_id.clone()).or_default();
        if address.is_default {
            for existing in room_addresses.iter_mut() {
                existing.is_default = false;
            }
        }
        match room_addresses.iter_mut().find(|a| a.id == address.id) {
            Some(existing) => *existing = address,
            None => room_addresses.push(address),
        }
        Ok(())
    }

    async fn get_address(&self, room_id: &str, address_id: &str) -> Result<Option<DeliveryAddress>, CofundError> {
        let addresses = self.addresses.read().await;
        Ok(addresses
            .get(room_id)
            .and_then(|list| list.iter().find(|a| a.id == address_id).cloned()))
    }

    async fn get_addresses(&self, room_id: &str) -> Result<Vec<DeliveryAddress>, CofundError> {
        let addresses = self.addresses.read().await;
        Ok(addresses.get(room_id).cloned().unwrap_or_default())
    }

    async fn delete_address(&self, room_id: &str, address_id: &str) -> Result<bool, CofundError> {
        let mut addresses = self.addresses.write().await;
        let Some(list) = addresses.get_mut(room_id) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|a| a.id != address_id);
        Ok(list.len() != before)
    }

    async fn save_session_audit(&self, audit: SessionAudit) -> Result<(), CofundError> {
        let mut session_audits = self.session_audits.write().await;
        session_audits
            .entry(audit.session_id.clone())
            .or_insert_with(Vec::new)
            .push(audit);
        Ok(())
    }

    async fn get_session_audits(&self, session_id: &str) -> Result<Vec<SessionAudit>, CofundError> {
        let session_audits = self.session_audits.read().await;
        Ok(session_audits.get(session_id).cloned().unwrap_or_default())
    }

    async fn save_incident(&self, incident: Incident) -> Result<(), CofundError> {
        self.incidents.write().await.push(incident);
        Ok(())
    }

    async fn get_incidents(&self) -> Result<Vec<Incident>, CofundError> {
        Ok(self.incidents.read().await.clone())
    }
}
