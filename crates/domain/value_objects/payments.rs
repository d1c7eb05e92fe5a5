use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::payments::PaymentEntity,
    value_objects::enums::{booking_statuses::BookingStatus, payment_statuses::PaymentStatus},
};

pub const MAX_PROOF_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_PAYMENT_METHOD_LEN: usize = 50;

/// Maps an accepted proof content type to the extension used for its object key.
pub fn proof_extension(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

pub fn proof_object_key(booking_id: Uuid, submitted_at: DateTime<Utc>, extension: &str) -> String {
    format!(
        "payments/payment_{}_{}.{}",
        booking_id,
        submitted_at.timestamp(),
        extension
    )
}

/// A stored proof waiting to be attached to its booking.
#[derive(Debug, Clone, PartialEq)]
pub struct ProofSubmission {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub payment_method: String,
    pub proof_image_locator: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum ProofOutcome {
    Submitted(PaymentEntity),
    BookingNotFound,
    PaymentExists,
    NotEligible { actual: BookingStatus },
    HoldExpired,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentModel {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PaymentEntity> for PaymentModel {
    type Error = anyhow::Error;

    fn try_from(entity: PaymentEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            booking_id: entity.booking_id,
            payment_method: entity.payment_method,
            payment_status: entity.payment_status.parse()?,
            payment_date: entity.payment_date,
            created_at: entity.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_jpeg_and_png_are_accepted() {
        assert_eq!(proof_extension("image/jpeg"), Some("jpg"));
        assert_eq!(proof_extension("image/JPG"), Some("jpg"));
        assert_eq!(proof_extension("image/png"), Some("png"));
        assert_eq!(proof_extension("image/gif"), None);
        assert_eq!(proof_extension("application/pdf"), None);
    }

    #[test]
    fn object_key_carries_booking_and_timestamp() {
        let booking_id = Uuid::new_v4();
        let submitted_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(
            proof_object_key(booking_id, submitted_at, "png"),
            format!("payments/payment_{booking_id}_1700000000.png")
        );
    }
}
