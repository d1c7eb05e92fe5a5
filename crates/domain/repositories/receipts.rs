use anyhow::Result;
use mockall::automock;

use crate::domain::value_objects::receipts::{BookingReceipt, RenderedDocument};

#[automock]
pub trait ReceiptRenderer {
    fn render(&self, receipt: &BookingReceipt) -> Result<RenderedDocument>;
}
