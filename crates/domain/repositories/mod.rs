pub mod booking_expiry;
pub mod bookings;
pub mod catalog;
pub mod payments;
pub mod receipts;
pub mod seat_ledger;
pub mod settlement;
pub mod storage;
pub mod users;
