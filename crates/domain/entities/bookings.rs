use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::bookings;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = bookings)]
pub struct BookingEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub schedule_id: Uuid,
    pub booking_time: DateTime<Utc>,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub payment_amount_minor: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct InsertBookingEntity {
    pub user_id: Uuid,
    pub schedule_id: Uuid,
    pub booking_time: DateTime<Utc>,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub payment_amount_minor: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
