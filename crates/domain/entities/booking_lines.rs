use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::booking_lines;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = booking_lines)]
pub struct BookingLineEntity {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub seat_id: Uuid,
    pub passenger_name: String,
    pub price_minor: i64,
    pub created_at: DateTime<Utc>,
    pub retired_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = booking_lines)]
pub struct InsertBookingLineEntity {
    pub booking_id: Uuid,
    pub seat_id: Uuid,
    pub passenger_name: String,
    pub price_minor: i64,
    pub created_at: DateTime<Utc>,
}
