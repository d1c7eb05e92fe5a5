pub mod postgres_connection;
pub mod retry;
pub mod schema;
