pub mod reservation;
pub mod resource;
pub mod slot;

pub use reservation::{Reservation, ReservationStatus};
pub use resource::Resource;
pub use slot::SlotTemplate;
