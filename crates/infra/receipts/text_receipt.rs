use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::domain::{
    repositories::receipts::ReceiptRenderer,
    value_objects::receipts::{BookingReceipt, RenderedDocument},
};

pub const RECEIPT_WIDTH: usize = 48;
const CURRENCY: &str = "IDR";

/// Fixed-width line builder for plain-text documents.
struct TextLayout {
    buf: String,
    width: usize,
}

impl TextLayout {
    fn new(width: usize) -> Self {
        Self {
            buf: String::with_capacity(2048),
            width,
        }
    }

    fn line(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(text);
        self.buf.push('\n');
        self
    }

    fn newline(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    fn centered(&mut self, text: &str) -> &mut Self {
        let len = text.chars().count();
        let pad = self.width.saturating_sub(len) / 2;
        let line = format!("{}{}", " ".repeat(pad), text);
        self.line(&line)
    }

    fn sep_double(&mut self) -> &mut Self {
        let line = "=".repeat(self.width);
        self.line(&line)
    }

    fn sep_single(&mut self) -> &mut Self {
        let line = "-".repeat(self.width);
        self.line(&line)
    }

    /// Left text and right text on one line, the left side truncated if both don't fit.
    fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let right = truncate(right, self.width.saturating_sub(2));
        let right_len = right.chars().count();
        let room = self.width.saturating_sub(right_len + 1);
        let left = truncate(left, room);
        let gap = self.width.saturating_sub(left.chars().count() + right_len);
        let line = format!("{}{}{}", left, " ".repeat(gap.max(1)), right);
        self.line(&line)
    }

    fn columns(&mut self, cells: &[(&str, usize)]) -> &mut Self {
        let line: String = cells
            .iter()
            .map(|(text, width)| format!("{:<width$}", truncate(text, *width), width = *width))
            .collect::<Vec<_>>()
            .join("");
        let line = line.trim_end().to_string();
        self.line(&line)
    }

    fn finish(self) -> String {
        self.buf
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else if max <= 1 {
        text.chars().take(max).collect()
    } else {
        let mut cut: String = text.chars().take(max - 1).collect();
        cut.push('~');
        cut
    }
}

pub fn format_amount(minor: i64) -> String {
    let digits = minor.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if minor < 0 { "-" } else { "" };
    format!("{CURRENCY} {sign}{grouped}")
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextReceiptRenderer;

impl TextReceiptRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ReceiptRenderer for TextReceiptRenderer {
    fn render(&self, receipt: &BookingReceipt) -> Result<RenderedDocument> {
        let mut layout = TextLayout::new(RECEIPT_WIDTH);

        layout
            .sep_double()
            .centered("SHUTTLE TICKET RECEIPT")
            .sep_double()
            .line_lr("Booking", &receipt.booking_id.to_string()[..8])
            .line(&format!("  {}", receipt.booking_id))
            .line_lr("Issued", &format_time(receipt.issued_at))
            .sep_single()
            .line_lr(
                "Route",
                &format!("{} -> {}", receipt.origin_city, receipt.destination_city),
            )
            .line_lr("Departure", &format_time(receipt.departure_time))
            .line_lr("Arrival", &format_time(receipt.arrival_time))
            .sep_single()
            .columns(&[("Passenger", 26), ("Seat", 6), ("Price", 16)]);

        for line in &receipt.lines {
            layout.columns(&[
                (line.passenger_name.as_str(), 26),
                (line.seat_number.as_str(), 6),
                (format_amount(line.price_minor).as_str(), 16),
            ]);
        }

        layout
            .sep_single()
            .line_lr("Payment method", &receipt.payment_method)
            .line_lr(
                "Verified at",
                &receipt
                    .paid_at
                    .map(format_time)
                    .unwrap_or_else(|| "-".to_string()),
            )
            .line_lr("TOTAL", &format_amount(receipt.total_minor))
            .sep_double()
            .centered("Thank you for travelling with us")
            .newline();

        Ok(RenderedDocument {
            bytes: layout.finish().into_bytes(),
            content_type: "text/plain; charset=utf-8".to_string(),
            file_name: format!("receipt_{}.txt", receipt.booking_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::receipts::ReceiptLine;
    use chrono::Duration;
    use uuid::Uuid;

    fn receipt() -> BookingReceipt {
        let departure = DateTime::from_timestamp(1_760_000_000, 0).unwrap();
        BookingReceipt {
            booking_id: Uuid::new_v4(),
            issued_at: departure - Duration::days(1),
            origin_city: "Jakarta".to_string(),
            destination_city: "Bandung".to_string(),
            departure_time: departure,
            arrival_time: departure + Duration::hours(3),
            lines: vec![
                ReceiptLine {
                    passenger_name: "Siti Rahma".to_string(),
                    seat_number: "A1".to_string(),
                    price_minor: 150_000,
                },
                ReceiptLine {
                    passenger_name: "A passenger with a remarkably long full name".to_string(),
                    seat_number: "A2".to_string(),
                    price_minor: 150_000,
                },
            ],
            payment_method: "bank_transfer".to_string(),
            paid_at: Some(departure - Duration::hours(20)),
            total_minor: 300_000,
        }
    }

    #[test]
    fn amounts_use_dot_grouping() {
        assert_eq!(format_amount(0), "IDR 0");
        assert_eq!(format_amount(150_000), "IDR 150.000");
        assert_eq!(format_amount(1_234_567), "IDR 1.234.567");
        assert_eq!(format_amount(-999), "IDR -999");
    }

    #[test]
    fn receipt_lists_route_passengers_and_total() {
        let receipt = receipt();
        let document = TextReceiptRenderer::new().render(&receipt).unwrap();
        let text = String::from_utf8(document.bytes).unwrap();

        assert!(text.contains("Jakarta -> Bandung"));
        assert!(text.contains("Siti Rahma"));
        assert!(text.contains("IDR 300.000"));
        assert!(text.contains(&receipt.booking_id.to_string()));
        assert_eq!(
            document.file_name,
            format!("receipt_{}.txt", receipt.booking_id)
        );
        assert!(document.content_type.starts_with("text/plain"));
    }

    #[test]
    fn no_line_exceeds_the_paper_width() {
        let document = TextReceiptRenderer::new().render(&receipt()).unwrap();
        let text = String::from_utf8(document.bytes).unwrap();
        for line in text.lines() {
            assert!(
                line.chars().count() <= RECEIPT_WIDTH,
                "line too wide: {line:?}"
            );
        }
    }
}
