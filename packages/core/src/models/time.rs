//! Clock Abstraction
//!
//! The metadata cache decides expiry by asking a [`TimeProvider`] for the
//! current time, so tests can move the clock forward instead of sleeping.
//!
//! # Examples
//!
//! ```rust
//! use pagebridge_core::models::time::{ManualTimeProvider, TimeProvider};
//! use chrono::Duration;
//!
//! let clock = ManualTimeProvider::new();
//! let before = clock.now();
//! clock.advance(Duration::minutes(5));
//! assert_eq!(clock.now() - before, Duration::minutes(5));
//! ```

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Source of the current UTC time
pub trait TimeProvider: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time provider used outside tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock
///
/// Shared behind an `Arc` by the cache under test, so it advances through
/// `&self` rather than `&mut self`.
#[derive(Debug)]
pub struct ManualTimeProvider {
    current_time: Mutex<DateTime<Utc>>,
}

impl ManualTimeProvider {
    /// Start at the current wall-clock time
    pub fn new() -> Self {
        Self::with_time(Utc::now())
    }

    /// Start at a fixed instant
    pub fn with_time(time: DateTime<Utc>) -> Self {
        Self {
            current_time: Mutex::new(time),
        }
    }

    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.lock() = time;
    }

    /// Move the clock forward by `duration`
    pub fn advance(&self, duration: chrono::Duration) {
        *self.lock() += duration;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid instant.
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_system_time_provider() {
        let provider = SystemTimeProvider;
        let now1 = provider.now();
        let now2 = Utc::now();

        assert!((now2 - now1).num_milliseconds().abs() < 1000);
    }

    #[test]
    fn test_manual_time_provider_with_time() {
        let specific_time = Utc::now() - Duration::days(7);
        let provider = ManualTimeProvider::with_time(specific_time);

        assert_eq!(provider.now(), specific_time);
    }

    #[test]
    fn test_manual_time_provider_set_time() {
        let provider = ManualTimeProvider::new();
        let new_time = Utc::now() + Duration::hours(3);

        provider.set_time(new_time);

        assert_eq!(provider.now(), new_time);
    }

    #[test]
    fn test_manual_time_provider_advance_through_shared_ref() {
        let provider = std::sync::Arc::new(ManualTimeProvider::new());
        let start_time = provider.now();

        let shared = provider.clone();
        shared.advance(Duration::hours(2));

        assert_eq!(provider.now() - start_time, Duration::hours(2));
    }
}
