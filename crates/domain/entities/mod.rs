pub mod booking_lines;
pub mod bookings;
pub mod payments;
pub mod routes;
pub mod schedules;
pub mod seats;
pub mod users;
