pub mod booking_expiry;
mod booking_ledger;
pub mod bookings;
pub mod catalog;
pub mod payments;
pub mod seat_ledger;
pub mod settlement;
pub mod users;
