use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::SlotTemplate;
use crate::services::catalog::SlotCatalog;
use crate::services::store::ReservationStore;

/// What the UI renders for one resource-day. `bookable: false` means the
/// date is outside the booking window (past, or too far ahead) — a policy
/// outcome, not an error.
#[derive(Debug, Serialize)]
pub struct DayAvailability {
    pub resource_id: String,
    pub date: NaiveDate,
    pub bookable: bool,
    pub slots: Vec<SlotTemplate>,
}

pub fn within_window(date: NaiveDate, max_advance_days: i64) -> bool {
    let today = Utc::now().date_naive();
    date >= today && date <= today + Duration::days(max_advance_days)
}

/// Catalog slots applicable on the date, minus any slot with a live
/// (confirmed or held-unexpired) reservation.
pub fn available_slots(
    catalog: &SlotCatalog,
    store: &ReservationStore,
    max_advance_days: i64,
    resource_id: &str,
    date: NaiveDate,
) -> Result<DayAvailability, AppError> {
    let all_slots = catalog.list_slots(resource_id)?;

    if !within_window(date, max_advance_days) {
        return Ok(DayAvailability {
            resource_id: resource_id.to_string(),
            date,
            bookable: false,
            slots: vec![],
        });
    }

    let taken: Vec<String> = store
        .list_by_resource_and_date(resource_id, date)?
        .into_iter()
        .filter(|r| store.is_live(r))
        .map(|r| r.slot_id)
        .collect();

    let slots = all_slots
        .into_iter()
        .filter(|slot| slot.applies_on(date) && !taken.contains(&slot.id))
        .collect();

    Ok(DayAvailability {
        resource_id: resource_id.to_string(),
        date,
        bookable: true,
        slots,
    })
}
