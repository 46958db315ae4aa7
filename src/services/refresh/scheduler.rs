use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use crate::models::challenge::Challenge;

use super::next_boundary;

const RETRY_BASE_SECONDS: i64 = 5;
const MAX_RETRY_SECONDS: i64 = 300;

/// Holds the single pending re-fetch deadline for a board.
///
/// The scheduler never owns a timer; the host arms one using
/// [`RefreshScheduler::time_until_due`] and asks [`RefreshScheduler::take_due`]
/// when it fires.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    safety_margin: Duration,
    deadline: Option<DateTime<Utc>>,
    consecutive_failures: u32,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(StdDuration::from_secs(1))
    }
}

impl RefreshScheduler {
    pub fn new(safety_margin: StdDuration) -> Self {
        Self {
            safety_margin: Duration::from_std(safety_margin).unwrap_or_else(|_| Duration::seconds(1)),
            deadline: None,
            consecutive_failures: 0,
        }
    }

    /// Replaces any pending deadline with one derived from `challenges`.
    /// A deadline beyond the representable range leaves nothing scheduled.
    pub fn reschedule(&mut self, challenges: &[Challenge], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.consecutive_failures = 0;
        self.deadline = self.boundary_deadline(challenges, now);

        match self.deadline {
            Some(deadline) => log::debug!("Next challenge refresh scheduled for {}", deadline),
            None => log::debug!("No pending challenge transitions; refresh not scheduled"),
        }

        self.deadline
    }

    /// Re-arms after a failed fetch: retries with exponential backoff, or at
    /// the next boundary of the data still shown if that comes first.
    pub fn schedule_retry(&mut self, challenges: &[Challenge], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let retry = now.checked_add_signed(Self::retry_delay(self.consecutive_failures));

        self.deadline = match (retry, self.boundary_deadline(challenges, now)) {
            (Some(retry), Some(boundary)) => Some(retry.min(boundary)),
            (retry, boundary) => retry.or(boundary),
        };

        log::debug!(
            "Refresh retry {} scheduled for {:?}",
            self.consecutive_failures,
            self.deadline
        );
        self.deadline
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Returns true at most once per deadline.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    pub fn time_until_due(&self, now: DateTime<Utc>) -> Option<StdDuration> {
        self.deadline.map(|deadline| {
            let delta = deadline - now;
            if delta <= Duration::zero() {
                StdDuration::from_secs(0)
            } else {
                delta.to_std().unwrap_or_else(|_| StdDuration::from_secs(0))
            }
        })
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
        self.consecutive_failures = 0;
    }

    fn boundary_deadline(&self, challenges: &[Challenge], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        next_boundary(challenges, now)
            .and_then(|delta| Duration::from_std(delta).ok())
            .and_then(|delta| now.checked_add_signed(delta))
            .and_then(|boundary| boundary.checked_add_signed(self.safety_margin))
    }

    fn retry_delay(failures: u32) -> Duration {
        let factor = 2_i64.saturating_pow(failures.saturating_sub(1).min(10));
        Duration::seconds(RETRY_BASE_SECONDS.saturating_mul(factor).min(MAX_RETRY_SECONDS))
    }
}
