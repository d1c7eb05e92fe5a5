pub mod expire_bookings;
