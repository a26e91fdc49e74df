//! Time Provider Abstraction
//!
//! Stores stamp create/update times through a [`TimeProvider`] so tests can
//! pin timestamps instead of racing the system clock.
//!
//! # Examples
//!
//! ```rust
//! use treesnap_core::models::time::{ManualTimeProvider, TimeProvider};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let clock = ManualTimeProvider::with_time(start);
//! clock.advance(Duration::minutes(5));
//! assert_eq!(clock.now() - start, Duration::minutes(5));
//! ```

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Trait for providing current time
pub trait TimeProvider: Send + Sync {
    /// Get the current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// System clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
///
/// Shared by reference (usually behind an `Arc`), so `set_time` and
/// `advance` take `&self`.
#[derive(Debug)]
pub struct ManualTimeProvider {
    current_time: Mutex<DateTime<Utc>>,
}

impl ManualTimeProvider {
    /// Start at the current system time
    pub fn new() -> Self {
        Self::with_time(Utc::now())
    }

    pub fn with_time(time: DateTime<Utc>) -> Self {
        Self {
            current_time: Mutex::new(time),
        }
    }

    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.lock() = time;
    }

    pub fn advance(&self, duration: chrono::Duration) {
        *self.lock() += duration;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid timestamp
        self.current_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TimeProvider for ManualTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

impl Default for ManualTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}
