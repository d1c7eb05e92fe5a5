use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::seats;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = seats)]
pub struct SeatEntity {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub seat_number: String,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = seats)]
pub struct InsertSeatEntity {
    pub schedule_id: Uuid,
    pub seat_number: String,
    pub is_booked: bool,
}
