use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{routes::RouteEntity, schedules::ScheduleEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRouteModel {
    pub origin_city: String,
    pub destination_city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteModel {
    pub id: Uuid,
    pub origin_city: String,
    pub destination_city: String,
}

impl From<RouteEntity> for RouteModel {
    fn from(entity: RouteEntity) -> Self {
        Self {
            id: entity.id,
            origin_city: entity.origin_city,
            destination_city: entity.destination_city,
        }
    }
}

/// Upper bound on a seat price, in minor units.
pub const MAX_PRICE_MINOR: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleModel {
    pub route_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_minor: i64,
    pub total_seats: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSearchQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Filter handed to the catalog repository. Every field narrows the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleFilter {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departs_from: Option<DateTime<Utc>>,
    pub departs_before: Option<DateTime<Utc>>,
    pub only_with_free_seats: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleModel {
    pub id: Uuid,
    pub route: RouteModel,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration: String,
    pub price_minor: i64,
    pub total_seats: i32,
    pub available_seats: i64,
    pub booked_seats: i64,
}

impl ScheduleModel {
    /// `free_seats` comes from the seat ledger, never from the schedule row.
    pub fn new(schedule: ScheduleEntity, route: RouteEntity, free_seats: i64) -> Self {
        let total = i64::from(schedule.total_seats);
        Self {
            id: schedule.id,
            route: RouteModel::from(route),
            duration: format_duration(schedule.departure_time, schedule.arrival_time),
            departure_time: schedule.departure_time,
            arrival_time: schedule.arrival_time,
            price_minor: schedule.price_minor,
            total_seats: schedule.total_seats,
            available_seats: free_seats,
            booked_seats: (total - free_seats).max(0),
        }
    }
}

pub fn format_duration(departure: DateTime<Utc>, arrival: DateTime<Utc>) -> String {
    let minutes = (arrival - departure).num_minutes().max(0);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    match (hours, minutes) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn duration_is_rendered_in_hours_and_minutes() {
        let departure = Utc::now();
        assert_eq!(
            format_duration(departure, departure + Duration::minutes(330)),
            "5h 30m"
        );
        assert_eq!(format_duration(departure, departure + Duration::hours(2)), "2h");
        assert_eq!(
            format_duration(departure, departure + Duration::minutes(45)),
            "45m"
        );
    }

    #[test]
    fn booked_seats_are_derived_from_free_seats() {
        let route = RouteEntity {
            id: Uuid::new_v4(),
            origin_city: "Jakarta".to_string(),
            destination_city: "Bandung".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let schedule = ScheduleEntity {
            id: Uuid::new_v4(),
            route_id: route.id,
            departure_time: Utc::now(),
            arrival_time: Utc::now() + Duration::hours(3),
            price_minor: 150_000,
            total_seats: 12,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let model = ScheduleModel::new(schedule, route, 9);
        assert_eq!(model.available_seats, 9);
        assert_eq!(model.booked_seats, 3);
        assert_eq!(model.route.origin_city, "Jakarta");
    }
}
