use std::{thread, time::Duration};

use anyhow::Result;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::warn;

pub const MAX_READ_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_millis(50);

/// Re-runs a read-only query on transient storage failures. Must never wrap writes.
pub fn with_read_retry<T>(operation: &str, mut read: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 1;
    loop {
        match read() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_READ_ATTEMPTS && is_transient(&err) => {
                warn!(
                    operation,
                    attempt,
                    error = ?err,
                    "read_retry: transient failure; retrying"
                );
                thread::sleep(BACKOFF_STEP * attempt);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

pub fn is_transient(err: &anyhow::Error) -> bool {
    if err.downcast_ref::<diesel::r2d2::PoolError>().is_some() {
        return true;
    }

    match err.downcast_ref::<DieselError>() {
        Some(DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _)) => true,
        Some(DieselError::DatabaseError(_, info)) => {
            let message = info.message().to_ascii_lowercase();
            message.contains("deadlock detected") || message.contains("statement timeout")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn db_error(kind: DatabaseErrorKind, message: &str) -> anyhow::Error {
        DieselError::DatabaseError(kind, Box::new(message.to_string())).into()
    }

    #[test]
    fn serialization_and_deadlock_failures_are_transient() {
        assert!(is_transient(&db_error(
            DatabaseErrorKind::SerializationFailure,
            "could not serialize access"
        )));
        assert!(is_transient(&db_error(
            DatabaseErrorKind::Unknown,
            "deadlock detected"
        )));
        assert!(!is_transient(&db_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value"
        )));
        assert!(!is_transient(&DieselError::NotFound.into()));
    }

    #[test]
    fn retries_transient_failures_up_to_the_limit() {
        let calls = Cell::new(0);
        let result: Result<()> = with_read_retry("test", || {
            calls.set(calls.get() + 1);
            Err(db_error(
                DatabaseErrorKind::SerializationFailure,
                "could not serialize access",
            ))
        });

        assert!(result.is_err());
        assert_eq!(calls.get(), MAX_READ_ATTEMPTS);
    }

    #[test]
    fn returns_first_success_after_a_transient_failure() {
        let calls = Cell::new(0);
        let result = with_read_retry("test", || {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(db_error(DatabaseErrorKind::Unknown, "deadlock detected"))
            } else {
                Ok(7)
            }
        });

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn permanent_failures_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = with_read_retry("test", || {
            calls.set(calls.get() + 1);
            Err(anyhow::anyhow!("relation does not exist"))
        });

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
