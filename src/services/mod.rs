pub mod availability;
pub mod booking;
pub mod catalog;
pub mod store;
pub mod sweeper;

pub use availability::DayAvailability;
pub use booking::{BookingResult, BookingService};
pub use catalog::SlotCatalog;
pub use store::ReservationStore;
