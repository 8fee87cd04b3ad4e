use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Reservation, ReservationStatus};

/// Sole owner of reservation rows. Every mutation goes through
/// `try_reserve` / `confirm` / `cancel`; nothing else writes the table.
///
/// The connection mutex is the exclusion boundary: `try_reserve` runs its
/// conflict check and insert while holding the lock, so no two callers can
/// both win the same (resource, date, slot) triple.
#[derive(Clone)]
pub struct ReservationStore {
    db: Arc<Mutex<Connection>>,
    hold_secs: i64,
}

impl ReservationStore {
    pub fn new(db: Arc<Mutex<Connection>>, hold_secs: i64) -> Self {
        Self { db, hold_secs }
    }

    /// Atomic check-and-insert. Fails with `Conflict` carrying the blocking
    /// reservation's id when the triple is already confirmed or under a
    /// live hold; lapsed holds do not block.
    pub fn try_reserve(
        &self,
        resource_id: &str,
        date: NaiveDate,
        slot_id: &str,
        requester_id: &str,
    ) -> Result<Reservation, AppError> {
        let now = Utc::now().naive_utc();
        let conn = self.db.lock().unwrap();

        if let Some(winner) = queries::find_live_conflict(&conn, resource_id, date, slot_id, now)? {
            return Err(AppError::Conflict(winner));
        }

        let reservation = Reservation {
            id: uuid::Uuid::new_v4().to_string(),
            resource_id: resource_id.to_string(),
            date,
            slot_id: slot_id.to_string(),
            requester_id: requester_id.to_string(),
            status: ReservationStatus::Held,
            hold_expires_at: Some(now + Duration::seconds(self.hold_secs)),
            created_at: now,
            updated_at: now,
        };
        queries::insert_reservation(&conn, &reservation)?;

        Ok(reservation)
    }

    /// `held -> confirmed`. A lapsed hold is flipped to `cancelled` and
    /// reported as `Expired`.
    pub fn confirm(&self, reservation_id: &str) -> Result<Reservation, AppError> {
        let now = Utc::now().naive_utc();
        let conn = self.db.lock().unwrap();

        let reservation = queries::get_reservation(&conn, reservation_id)?
            .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id}")))?;

        match reservation.status {
            ReservationStatus::Confirmed | ReservationStatus::Cancelled => {
                return Err(AppError::InvalidState(format!(
                    "reservation {reservation_id} is already {}",
                    reservation.status.as_str()
                )));
            }
            ReservationStatus::Held => {}
        }

        if self.hold_lapsed(&reservation, now) {
            queries::update_reservation_status(&conn, reservation_id, ReservationStatus::Cancelled)?;
            return Err(AppError::Expired(reservation_id.to_string()));
        }

        queries::update_reservation_status(&conn, reservation_id, ReservationStatus::Confirmed)?;
        queries::get_reservation(&conn, reservation_id)?
            .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id}")))
    }

    /// Idempotent: cancelling an already-cancelled reservation is a no-op.
    pub fn cancel(&self, reservation_id: &str) -> Result<(), AppError> {
        let conn = self.db.lock().unwrap();

        let reservation = queries::get_reservation(&conn, reservation_id)?
            .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id}")))?;

        if reservation.status.is_terminal() {
            return Ok(());
        }

        queries::update_reservation_status(&conn, reservation_id, ReservationStatus::Cancelled)?;
        Ok(())
    }

    pub fn get(&self, reservation_id: &str) -> Result<Reservation, AppError> {
        let conn = self.db.lock().unwrap();
        queries::get_reservation(&conn, reservation_id)?
            .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id}")))
    }

    /// Reservations for one resource-day, ordered by slot start time.
    pub fn list_by_resource_and_date(
        &self,
        resource_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, AppError> {
        let conn = self.db.lock().unwrap();
        Ok(queries::list_by_resource_and_date(&conn, resource_id, date)?)
    }

    pub fn list_by_requester(&self, requester_id: &str) -> Result<Vec<Reservation>, AppError> {
        let conn = self.db.lock().unwrap();
        Ok(queries::list_by_requester(&conn, requester_id)?)
    }

    pub fn list_all(
        &self,
        status_filter: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Reservation>, AppError> {
        let conn = self.db.lock().unwrap();
        Ok(queries::list_all_reservations(&conn, status_filter, limit)?)
    }

    /// Cancels every confirmed or live held reservation on a resource.
    /// Used when a resource is administratively deactivated.
    pub fn cancel_all_for_resource(&self, resource_id: &str) -> Result<usize, AppError> {
        let now = Utc::now().naive_utc();
        let conn = self.db.lock().unwrap();
        Ok(queries::cancel_all_for_resource(&conn, resource_id, now)?)
    }

    /// Hygiene sweep. Correctness never depends on this running: the
    /// conflict check and `confirm` already treat lapsed holds as dead.
    pub fn expire_stale_holds(&self) -> Result<usize, AppError> {
        let now = Utc::now().naive_utc();
        let conn = self.db.lock().unwrap();
        Ok(queries::expire_stale_holds(&conn, now)?)
    }

    /// Live reservations (confirmed, or held and unexpired) block a slot.
    pub fn is_live(&self, reservation: &Reservation) -> bool {
        let now = Utc::now().naive_utc();
        match reservation.status {
            ReservationStatus::Confirmed => true,
            ReservationStatus::Held => !self.hold_lapsed(reservation, now),
            ReservationStatus::Cancelled => false,
        }
    }

    fn hold_lapsed(&self, reservation: &Reservation, now: NaiveDateTime) -> bool {
        match reservation.hold_expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn store_with_hold(hold_secs: i64) -> ReservationStore {
        let conn = db::init_db(":memory:").unwrap();
        let db = Arc::new(Mutex::new(conn));
        {
            let conn = db.lock().unwrap();
            queries::create_resource(&conn, "gym", "Gym").unwrap();
        }
        ReservationStore::new(db, hold_secs)
    }

    fn store() -> ReservationStore {
        store_with_hold(300)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_reserve_then_conflict() {
        let store = store();
        let first = store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-a")
            .unwrap();
        assert_eq!(first.status, ReservationStatus::Held);

        let err = store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-b")
            .unwrap_err();
        match err {
            AppError::Conflict(winner) => assert_eq!(winner, first.id),
            other => panic!("expected conflict, got: {other}"),
        }
    }

    #[test]
    fn test_different_triples_are_independent() {
        let store = store();
        store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-a")
            .unwrap();
        store
            .try_reserve("gym", date("2025-11-01"), "08:00-10:00", "resident-b")
            .unwrap();
        store
            .try_reserve("gym", date("2025-11-02"), "06:00-08:00", "resident-b")
            .unwrap();
    }

    #[test]
    fn test_confirm_transitions_held() {
        let store = store();
        let held = store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-a")
            .unwrap();

        let confirmed = store.confirm(&held.id).unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);

        // Second confirm is an invalid transition
        assert!(matches!(
            store.confirm(&held.id),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn test_confirm_missing_reservation() {
        let store = store();
        assert!(matches!(
            store.confirm("no-such-id"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let store = store();
        let held = store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-a")
            .unwrap();
        let confirmed = store.confirm(&held.id).unwrap();

        store.cancel(&confirmed.id).unwrap();
        assert_eq!(
            store.get(&confirmed.id).unwrap().status,
            ReservationStatus::Cancelled
        );

        // No error, no state change on repeat
        store.cancel(&confirmed.id).unwrap();
        assert_eq!(
            store.get(&confirmed.id).unwrap().status,
            ReservationStatus::Cancelled
        );
    }

    #[test]
    fn test_cancel_frees_the_slot() {
        let store = store();
        let held = store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-a")
            .unwrap();
        store.confirm(&held.id).unwrap();
        store.cancel(&held.id).unwrap();

        // Same triple is reservable again
        store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-b")
            .unwrap();
    }

    #[test]
    fn test_expired_hold_does_not_block() {
        let store = store_with_hold(0);
        let stale = store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-a")
            .unwrap();

        // Hold expired immediately; a new caller can take the triple
        let fresh = store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-b")
            .unwrap();
        assert_ne!(stale.id, fresh.id);

        // Confirming the stale hold fails and flips it to cancelled
        assert!(matches!(store.confirm(&stale.id), Err(AppError::Expired(_))));
        assert_eq!(
            store.get(&stale.id).unwrap().status,
            ReservationStatus::Cancelled
        );
    }

    #[test]
    fn test_expire_stale_holds_sweep() {
        let store = store_with_hold(0);
        store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-a")
            .unwrap();
        store
            .try_reserve("gym", date("2025-11-01"), "08:00-10:00", "resident-b")
            .unwrap();

        let swept = store.expire_stale_holds().unwrap();
        assert_eq!(swept, 2);
        assert_eq!(store.expire_stale_holds().unwrap(), 0);
    }

    #[test]
    fn test_round_trip_by_resource_and_date() {
        let store = store();
        let held = store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-a")
            .unwrap();
        store.confirm(&held.id).unwrap();

        let listed = store
            .list_by_resource_and_date("gym", date("2025-11-01"))
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].resource_id, "gym");
        assert_eq!(listed[0].date, date("2025-11-01"));
        assert_eq!(listed[0].slot_id, "06:00-08:00");
        assert_eq!(listed[0].requester_id, "resident-a");
    }

    #[test]
    fn test_cancel_all_for_resource() {
        let store = store();
        let a = store
            .try_reserve("gym", date("2025-11-01"), "06:00-08:00", "resident-a")
            .unwrap();
        store.confirm(&a.id).unwrap();
        let b = store
            .try_reserve("gym", date("2025-11-02"), "06:00-08:00", "resident-b")
            .unwrap();

        let cancelled = store.cancel_all_for_resource("gym").unwrap();
        assert_eq!(cancelled, 2);
        assert_eq!(store.get(&a.id).unwrap().status, ReservationStatus::Cancelled);
        assert_eq!(store.get(&b.id).unwrap().status, ReservationStatus::Cancelled);
    }
}
