use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Resource, SlotTemplate};

/// Read side of the slot configuration: which resources exist and what
/// windows each one can be booked in. Pure configuration, no booking state.
#[derive(Clone)]
pub struct SlotCatalog {
    db: Arc<Mutex<Connection>>,
}

impl SlotCatalog {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    pub fn list_resources(&self) -> Result<Vec<Resource>, AppError> {
        let conn = self.db.lock().unwrap();
        Ok(queries::list_resources(&conn)?)
    }

    pub fn get_resource(&self, resource_id: &str) -> Result<Resource, AppError> {
        let conn = self.db.lock().unwrap();
        queries::get_resource(&conn, resource_id)?
            .ok_or_else(|| AppError::NotFound(format!("resource {resource_id}")))
    }

    /// All slots configured for a resource, ordered by start time.
    pub fn list_slots(&self, resource_id: &str) -> Result<Vec<SlotTemplate>, AppError> {
        let conn = self.db.lock().unwrap();
        if queries::get_resource(&conn, resource_id)?.is_none() {
            return Err(AppError::NotFound(format!("resource {resource_id}")));
        }
        Ok(queries::get_slots_for_resource(&conn, resource_id)?)
    }

    pub fn get_slot(&self, resource_id: &str, slot_id: &str) -> Result<SlotTemplate, AppError> {
        let conn = self.db.lock().unwrap();
        queries::get_slot(&conn, resource_id, slot_id)?
            .ok_or_else(|| AppError::NotFound(format!("slot {slot_id} on resource {resource_id}")))
    }

    pub fn add_resource(&self, id: &str, name: &str) -> Result<Resource, AppError> {
        if id.trim().is_empty() || name.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "resource id and name must not be empty".to_string(),
            ));
        }

        let conn = self.db.lock().unwrap();
        if queries::get_resource(&conn, id)?.is_some() {
            return Err(AppError::InvalidRequest(format!(
                "resource already exists: {id}"
            )));
        }
        Ok(queries::create_resource(&conn, id, name)?)
    }

    /// Adds a slot template, holding the catalog invariant: windows within
    /// a resource are non-overlapping with strictly increasing start times.
    pub fn add_slot(
        &self,
        resource_id: &str,
        start: &str,
        end: &str,
        days: Option<Vec<String>>,
    ) -> Result<SlotTemplate, AppError> {
        let slot = SlotTemplate::new(resource_id, start, end, days)
            .map_err(|e| AppError::InvalidRequest(e.to_string()))?;

        let conn = self.db.lock().unwrap();
        if queries::get_resource(&conn, resource_id)?.is_none() {
            return Err(AppError::NotFound(format!("resource {resource_id}")));
        }

        let existing = queries::get_slots_for_resource(&conn, resource_id)?;
        for other in &existing {
            if slot.overlaps(other) {
                return Err(AppError::InvalidRequest(format!(
                    "slot {} overlaps existing slot {}",
                    slot.id, other.id
                )));
            }
        }

        queries::insert_slot(&conn, &slot)?;
        Ok(slot)
    }

    pub fn deactivate_resource(&self, resource_id: &str) -> Result<(), AppError> {
        let conn = self.db.lock().unwrap();
        if !queries::set_resource_active(&conn, resource_id, false)? {
            return Err(AppError::NotFound(format!("resource {resource_id}")));
        }
        Ok(())
    }
}
