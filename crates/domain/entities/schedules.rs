use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::schedules;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = schedules)]
pub struct ScheduleEntity {
    pub id: Uuid,
    pub route_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_minor: i64,
    pub total_seats: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schedules)]
pub struct InsertScheduleEntity {
    pub route_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_minor: i64,
    pub total_seats: i32,
}
