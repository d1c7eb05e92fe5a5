pub mod booking_reaper;
