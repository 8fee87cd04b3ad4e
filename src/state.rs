use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::{BookingService, ReservationStore, SlotCatalog};

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub catalog: SlotCatalog,
    pub store: ReservationStore,
    pub booking: BookingService,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        let db = Arc::new(Mutex::new(conn));
        let catalog = SlotCatalog::new(Arc::clone(&db));
        let store = ReservationStore::new(Arc::clone(&db), config.hold_secs);
        let booking = BookingService::new(
            catalog.clone(),
            store.clone(),
            config.max_advance_days,
        );
        Self {
            db,
            config,
            catalog,
            store,
            booking,
        }
    }
}
