use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::payments::PaymentEntity,
    value_objects::payments::{ProofOutcome, ProofSubmission},
};

#[async_trait]
#[automock]
pub trait PaymentRepository {
    async fn find_by_booking_id(&self, booking_id: Uuid) -> Result<Option<PaymentEntity>>;

    /// Creates the pending payment and moves the booking to `waiting_verification`.
    async fn submit_proof(&self, submission: ProofSubmission) -> Result<ProofOutcome>;
}
