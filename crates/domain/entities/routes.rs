use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::routes;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = routes)]
pub struct RouteEntity {
    pub id: Uuid,
    pub origin_city: String,
    pub destination_city: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = routes)]
pub struct InsertRouteEntity {
    pub origin_city: String,
    pub destination_city: String,
}
