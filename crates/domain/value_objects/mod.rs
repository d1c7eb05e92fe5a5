pub mod bookings;
pub mod enums;
pub mod iam;
pub mod pagination;
pub mod payments;
pub mod receipts;
pub mod schedules;
pub mod seats;
