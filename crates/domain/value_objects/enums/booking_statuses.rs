use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    WaitingVerification,
    Success,
    Rejected,
    Expired,
    Cancelled,
}

/// Things that can happen to a booking after it has been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    ProofUploaded,
    StaffAccepted,
    StaffRejected,
    HoldElapsed,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("booking in status {from} cannot handle {event:?}")]
pub struct InvalidTransition {
    pub from: BookingStatus,
    pub event: BookingEvent,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::WaitingVerification => "waiting_verification",
            BookingStatus::Success => "success",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Expired => "expired",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses whose booking lines hold their seats.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::WaitingVerification | BookingStatus::Success
        )
    }

    /// Persisted strings of the seat-holding statuses, for `eq_any` filters.
    pub fn active_statuses() -> Vec<String> {
        [
            BookingStatus::Pending,
            BookingStatus::WaitingVerification,
            BookingStatus::Success,
            BookingStatus::Rejected,
            BookingStatus::Expired,
            BookingStatus::Cancelled,
        ]
        .into_iter()
        .filter(BookingStatus::is_active)
        .map(|status| status.to_string())
        .collect()
    }

    pub fn transition(self, event: BookingEvent) -> Result<BookingStatus, InvalidTransition> {
        match (self, event) {
            (BookingStatus::Pending, BookingEvent::ProofUploaded) => {
                Ok(BookingStatus::WaitingVerification)
            }
            (BookingStatus::Pending, BookingEvent::HoldElapsed) => Ok(BookingStatus::Expired),
            (BookingStatus::WaitingVerification, BookingEvent::StaffAccepted) => {
                Ok(BookingStatus::Success)
            }
            (BookingStatus::WaitingVerification, BookingEvent::StaffRejected) => {
                Ok(BookingStatus::Rejected)
            }
            (
                BookingStatus::Pending
                | BookingStatus::WaitingVerification
                | BookingStatus::Success
                | BookingStatus::Rejected
                | BookingStatus::Expired
                | BookingStatus::Cancelled,
                event,
            ) => Err(InvalidTransition { from: self, event }),
        }
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(BookingStatus::Pending),
            "waiting_verification" => Ok(BookingStatus::WaitingVerification),
            "success" => Ok(BookingStatus::Success),
            "rejected" => Ok(BookingStatus::Rejected),
            "expired" => Ok(BookingStatus::Expired),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(anyhow::anyhow!("unknown booking status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [BookingStatus; 6] = [
        BookingStatus::Pending,
        BookingStatus::WaitingVerification,
        BookingStatus::Success,
        BookingStatus::Rejected,
        BookingStatus::Expired,
        BookingStatus::Cancelled,
    ];

    #[test]
    fn pending_moves_to_waiting_verification_on_proof() {
        assert_eq!(
            BookingStatus::Pending.transition(BookingEvent::ProofUploaded),
            Ok(BookingStatus::WaitingVerification)
        );
    }

    #[test]
    fn pending_expires_when_hold_elapses() {
        assert_eq!(
            BookingStatus::Pending.transition(BookingEvent::HoldElapsed),
            Ok(BookingStatus::Expired)
        );
    }

    #[test]
    fn staff_decisions_only_apply_to_waiting_verification() {
        for status in ALL {
            let accepted = status.transition(BookingEvent::StaffAccepted);
            let rejected = status.transition(BookingEvent::StaffRejected);
            if status == BookingStatus::WaitingVerification {
                assert_eq!(accepted, Ok(BookingStatus::Success));
                assert_eq!(rejected, Ok(BookingStatus::Rejected));
            } else {
                assert!(accepted.is_err(), "{status} accepted a staff approval");
                assert!(rejected.is_err(), "{status} accepted a staff rejection");
            }
        }
    }

    #[test]
    fn terminal_statuses_reject_every_event() {
        let events = [
            BookingEvent::ProofUploaded,
            BookingEvent::StaffAccepted,
            BookingEvent::StaffRejected,
            BookingEvent::HoldElapsed,
        ];
        let terminal = [
            BookingStatus::Success,
            BookingStatus::Rejected,
            BookingStatus::Expired,
            BookingStatus::Cancelled,
        ];
        for status in terminal {
            for event in events {
                assert_eq!(
                    status.transition(event),
                    Err(InvalidTransition { from: status, event })
                );
            }
        }
    }

    #[test]
    fn waiting_verification_cannot_expire() {
        assert!(
            BookingStatus::WaitingVerification
                .transition(BookingEvent::HoldElapsed)
                .is_err()
        );
    }

    #[test]
    fn only_live_and_approved_bookings_hold_seats() {
        let holding: Vec<_> = ALL.into_iter().filter(BookingStatus::is_active).collect();
        assert_eq!(
            holding,
            vec![
                BookingStatus::Pending,
                BookingStatus::WaitingVerification,
                BookingStatus::Success
            ]
        );
        assert_eq!(
            BookingStatus::active_statuses(),
            vec!["pending", "waiting_verification", "success"]
        );
    }

    #[test]
    fn parses_persisted_strings() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("paid".parse::<BookingStatus>().is_err());
    }
}
