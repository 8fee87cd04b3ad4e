use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::Reservation;
use crate::services::availability::{self, DayAvailability};
use crate::services::catalog::SlotCatalog;
use crate::services::store::ReservationStore;

/// User-facing outcome of a booking attempt. Validation failures surface
/// as errors; losing the slot race is a normal outcome, not an error.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum BookingResult {
    Confirmed { reservation: Reservation },
    Unavailable,
    Failed { reason: String },
}

/// Orchestrates validate -> reserve -> confirm. Every UI entry point books
/// through here; nothing else pairs a reserve with a confirm.
#[derive(Clone)]
pub struct BookingService {
    catalog: SlotCatalog,
    store: ReservationStore,
    max_advance_days: i64,
}

impl BookingService {
    pub fn new(catalog: SlotCatalog, store: ReservationStore, max_advance_days: i64) -> Self {
        Self {
            catalog,
            store,
            max_advance_days,
        }
    }

    pub fn available_slots(
        &self,
        resource_id: &str,
        date: NaiveDate,
    ) -> Result<DayAvailability, AppError> {
        availability::available_slots(
            &self.catalog,
            &self.store,
            self.max_advance_days,
            resource_id,
            date,
        )
    }

    pub fn book(
        &self,
        resource_id: &str,
        date: NaiveDate,
        slot_id: &str,
        requester_id: &str,
    ) -> Result<BookingResult, AppError> {
        if requester_id.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "requester id must not be empty".to_string(),
            ));
        }

        let resource = self.catalog.get_resource(resource_id)?;
        if !resource.active {
            return Err(AppError::InvalidRequest(format!(
                "resource {resource_id} is not active"
            )));
        }

        if !availability::within_window(date, self.max_advance_days) {
            return Err(AppError::InvalidRequest(format!(
                "date {date} is outside the booking window"
            )));
        }

        let slot = self.catalog.get_slot(resource_id, slot_id)?;
        if !slot.applies_on(date) {
            return Err(AppError::InvalidRequest(format!(
                "slot {slot_id} does not run on {date}"
            )));
        }

        // Instant confirmation: reserve then confirm immediately. An
        // expired hold here means the hold window is effectively zero;
        // retry the whole pair once, then give up.
        for _ in 0..2 {
            let held = match self.store.try_reserve(resource_id, date, slot_id, requester_id) {
                Ok(held) => held,
                Err(AppError::Conflict(_)) => return Ok(BookingResult::Unavailable),
                Err(e) => return Err(e),
            };

            match self.store.confirm(&held.id) {
                Ok(reservation) => {
                    tracing::info!(
                        reservation_id = %reservation.id,
                        resource_id,
                        %date,
                        slot_id,
                        "booking confirmed"
                    );
                    return Ok(BookingResult::Confirmed { reservation });
                }
                Err(AppError::Expired(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(BookingResult::Failed {
            reason: "hold expired before confirmation".to_string(),
        })
    }

    /// Only the reservation's own requester may cancel it. Idempotent past
    /// that check.
    pub fn cancel_booking(&self, reservation_id: &str, requester_id: &str) -> Result<(), AppError> {
        let reservation = self.store.get(reservation_id)?;
        if reservation.requester_id != requester_id {
            return Err(AppError::Forbidden);
        }
        self.store.cancel(reservation_id)
    }

    pub fn my_bookings(&self, requester_id: &str) -> Result<Vec<Reservation>, AppError> {
        self.store.list_by_requester(requester_id)
    }

    /// Deactivation takes the resource out of the catalog for new bookings
    /// and cancels everything live on it.
    pub fn deactivate_resource(&self, resource_id: &str) -> Result<usize, AppError> {
        self.catalog.deactivate_resource(resource_id)?;
        let cancelled = self.store.cancel_all_for_resource(resource_id)?;
        tracing::info!(resource_id, cancelled, "resource deactivated");
        Ok(cancelled)
    }
}
