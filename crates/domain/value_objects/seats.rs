use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::seats::SeatEntity;

pub const SEATS_PER_ROW: usize = 4;
pub const MAX_SEATS_PER_SCHEDULE: i32 = 50;

/// Row-major seat label: `A1..A4`, `B1..B4`, ... then `AA1` once the alphabet runs out.
pub fn seat_label(index: usize) -> String {
    let mut row = index / SEATS_PER_ROW;
    let column = index % SEATS_PER_ROW + 1;

    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (row % 26) as u8) as char);
        if row < 26 {
            break;
        }
        row = row / 26 - 1;
    }
    letters.reverse();

    format!("{}{}", letters.into_iter().collect::<String>(), column)
}

pub fn seat_labels(total_seats: usize) -> Vec<String> {
    (0..total_seats).map(seat_label).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatModel {
    pub id: Uuid,
    pub seat_number: String,
    pub is_booked: bool,
}

impl From<SeatEntity> for SeatModel {
    fn from(entity: SeatEntity) -> Self {
        Self {
            id: entity.id,
            seat_number: entity.seat_number,
            is_booked: entity.is_booked,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatAvailabilityModel {
    pub schedule_id: Uuid,
    pub total_seats: i64,
    pub available_seats: i64,
    pub booked_seats: i64,
    pub seats: Vec<SeatModel>,
}

impl SeatAvailabilityModel {
    pub fn from_ledger(schedule_id: Uuid, seats: Vec<SeatEntity>) -> Self {
        let booked_seats = seats.iter().filter(|seat| seat.is_booked).count() as i64;
        let total_seats = seats.len() as i64;

        Self {
            schedule_id,
            total_seats,
            available_seats: total_seats - booked_seats,
            booked_seats,
            seats: seats.into_iter().map(SeatModel::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn labels_fill_rows_of_four() {
        assert_eq!(
            seat_labels(6),
            vec!["A1", "A2", "A3", "A4", "B1", "B2"]
        );
        assert_eq!(seat_label(49), "M2");
    }

    #[test]
    fn labels_stay_unique_past_the_alphabet() {
        let labels = seat_labels(26 * SEATS_PER_ROW + 1);
        assert_eq!(labels.last().map(String::as_str), Some("AA1"));

        let mut deduped = labels.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), labels.len());
    }

    #[test]
    fn availability_counts_add_up_to_total() {
        let schedule_id = Uuid::new_v4();
        let seats = seat_labels(5)
            .into_iter()
            .enumerate()
            .map(|(index, label)| SeatEntity {
                id: Uuid::new_v4(),
                schedule_id,
                seat_number: label,
                is_booked: index % 2 == 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .collect();

        let model = SeatAvailabilityModel::from_ledger(schedule_id, seats);
        assert_eq!(model.total_seats, 5);
        assert_eq!(model.booked_seats, 3);
        assert_eq!(model.available_seats + model.booked_seats, model.total_seats);
    }
}
