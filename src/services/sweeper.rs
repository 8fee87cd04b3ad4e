use std::time::Duration;

use crate::services::store::ReservationStore;

/// Background hygiene: periodically flips lapsed holds to cancelled so
/// they stop showing up as held rows. Booking correctness does not depend
/// on this task; the store already ignores lapsed holds.
pub fn spawn(store: ReservationStore, interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;
            match store.expire_stale_holds() {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "expired stale holds"),
                Err(e) => tracing::warn!("hold sweep failed: {e}"),
            }
        }
    })
}
