use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use shuttle::domain::{
    repositories::{
        bookings::BookingRepository, payments::PaymentRepository, storage::ObjectStorage,
    },
    value_objects::{
        enums::booking_statuses::BookingStatus,
        payments::{
            MAX_PAYMENT_METHOD_LEN, MAX_PROOF_BYTES, PaymentModel, ProofOutcome, ProofSubmission,
            proof_extension, proof_object_key,
        },
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::errors::{BookingError, UseCaseResult};

/// A proof image as received from the multipart form.
#[derive(Debug, Clone)]
pub struct ProofUpload {
    pub payment_method: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct StoredProof {
    pub bytes: Bytes,
    pub content_type: String,
    pub file_name: String,
}

pub struct PaymentProofUseCase<B, P, S>
where
    B: BookingRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + ?Sized + 'static,
{
    booking_repository: Arc<B>,
    payment_repository: Arc<P>,
    storage: Arc<S>,
}

impl<B, P, S> PaymentProofUseCase<B, P, S>
where
    B: BookingRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + ?Sized + 'static,
{
    pub fn new(booking_repository: Arc<B>, payment_repository: Arc<P>, storage: Arc<S>) -> Self {
        Self {
            booking_repository,
            payment_repository,
            storage,
        }
    }

    /// Stores the proof, records the pending payment and moves the booking to
    /// `waiting_verification`. Preconditions are checked here first and again under a row lock.
    pub async fn submit_proof(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        upload: ProofUpload,
        now: DateTime<Utc>,
    ) -> UseCaseResult<PaymentModel> {
        let payment_method = upload.payment_method.trim().to_string();
        if payment_method.is_empty() || payment_method.chars().count() > MAX_PAYMENT_METHOD_LEN {
            return Err(BookingError::Validation(format!(
                "payment_method must be 1 to {MAX_PAYMENT_METHOD_LEN} characters"
            )));
        }
        if upload.bytes.is_empty() || upload.bytes.len() > MAX_PROOF_BYTES {
            return Err(BookingError::Validation(
                "proof_image must be a non-empty file of at most 5 MiB".to_string(),
            ));
        }
        let extension = proof_extension(&upload.content_type).ok_or_else(|| {
            BookingError::Validation("proof_image must be a JPEG or PNG image".to_string())
        })?;

        let aggregate = self
            .booking_repository
            .find_booking(booking_id, Some(user_id))
            .await?
            .ok_or_else(|| BookingError::NotFound("booking".to_string()))?;
        if self
            .payment_repository
            .find_by_booking_id(booking_id)
            .await?
            .is_some()
        {
            return Err(payment_exists());
        }
        let status: BookingStatus = aggregate.booking.status.parse()?;
        if status != BookingStatus::Pending {
            return Err(not_pending(status));
        }
        if aggregate.booking.expires_at <= now {
            warn!(%booking_id, %user_id, "payments: proof arrived after hold expiry");
            return Err(BookingError::Expired);
        }

        let key = proof_object_key(booking_id, now, extension);
        let locator = self
            .storage
            .put_object(key, upload.bytes, upload.content_type)
            .await?;

        let submitted = self
            .payment_repository
            .submit_proof(ProofSubmission {
                booking_id,
                user_id,
                payment_method,
                proof_image_locator: locator.clone(),
                submitted_at: now,
            })
            .await;

        let refusal = match submitted {
            Ok(ProofOutcome::Submitted(payment)) => {
                info!(%booking_id, payment_id = %payment.id, "payments: proof submitted");
                return Ok(PaymentModel::try_from(payment)?);
            }
            Ok(ProofOutcome::BookingNotFound) => BookingError::NotFound("booking".to_string()),
            Ok(ProofOutcome::PaymentExists) => payment_exists(),
            Ok(ProofOutcome::NotEligible { actual }) => not_pending(actual),
            Ok(ProofOutcome::HoldExpired) => BookingError::Expired,
            Err(err) => BookingError::Internal(err),
        };

        warn!(%booking_id, error = %refusal, "payments: proof refused after upload");
        if let Err(err) = self.storage.delete_object(locator.clone()).await {
            error!(%booking_id, %locator, error = ?err, "payments: failed to delete orphaned proof");
        }

        Err(refusal)
    }

    pub async fn download_proof(&self, booking_id: Uuid) -> UseCaseResult<StoredProof> {
        let payment = self
            .payment_repository
            .find_by_booking_id(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("payment".to_string()))?;

        let locator = payment.proof_image_locator;
        let bytes = self
            .storage
            .get_object(locator.clone())
            .await?
            .ok_or_else(|| {
                error!(%booking_id, %locator, "payments: proof object missing from storage");
                BookingError::NotFound("payment proof".to_string())
            })?;

        let content_type = mime_guess::from_path(&locator)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let file_name = locator
            .rsplit('/')
            .next()
            .unwrap_or(locator.as_str())
            .to_string();

        Ok(StoredProof {
            bytes,
            content_type,
            file_name,
        })
    }
}

/// A reaped hold is reported as expired, not as a generic state mismatch.
fn not_pending(actual: BookingStatus) -> BookingError {
    match actual {
        BookingStatus::Expired => BookingError::Expired,
        actual => BookingError::InvalidState {
            expected: BookingStatus::Pending,
            actual,
        },
    }
}

fn payment_exists() -> BookingError {
    BookingError::Conflict("payment already exists for this booking".to_string())
}
