//! Clock port for time-related operations

use chrono::{DateTime, Utc};

/// Port for getting the current time.
///
/// Token expiry is computed against this clock, so tests can move time
/// forward without sleeping.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current time as epoch seconds.
    fn epoch_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}
