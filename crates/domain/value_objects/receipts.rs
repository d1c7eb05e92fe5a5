use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::value_objects::bookings::BookingAggregate;

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    pub passenger_name: String,
    pub seat_number: String,
    pub price_minor: i64,
}

/// Data printed on a receipt for a settled booking.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingReceipt {
    pub booking_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub origin_city: String,
    pub destination_city: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub lines: Vec<ReceiptLine>,
    pub payment_method: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub total_minor: i64,
}

impl BookingReceipt {
    pub fn from_aggregate(aggregate: &BookingAggregate, issued_at: DateTime<Utc>) -> Result<Self> {
        let payment = aggregate
            .payment
            .as_ref()
            .context("settled booking has no payment record")?;

        Ok(Self {
            booking_id: aggregate.booking.id,
            issued_at,
            origin_city: aggregate.route.origin_city.clone(),
            destination_city: aggregate.route.destination_city.clone(),
            departure_time: aggregate.schedule.departure_time,
            arrival_time: aggregate.schedule.arrival_time,
            lines: aggregate
                .lines
                .iter()
                .filter(|(line, _)| line.retired_at.is_none())
                .map(|(line, seat)| ReceiptLine {
                    passenger_name: line.passenger_name.clone(),
                    seat_number: seat.seat_number.clone(),
                    price_minor: line.price_minor,
                })
                .collect(),
            payment_method: payment.payment_method.clone(),
            paid_at: payment.payment_date,
            total_minor: aggregate.booking.payment_amount_minor,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}
