pub mod db;
pub mod receipts;
pub mod storages;
