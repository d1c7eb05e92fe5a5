pub mod bookings;
pub mod catalog;
pub mod errors;
pub mod iam;
pub mod payment_proofs;
pub mod receipts;
pub mod seats;
pub mod settlement;

#[cfg(test)]
pub(crate) mod fixtures;
