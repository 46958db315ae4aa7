//! Temporal status and countdown derivation for challenges.
//!
//! Everything here is a pure function of `(challenge, now)`: no state is kept
//! between calls, so the board can re-derive on every display tick.

mod urgency;

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::models::challenge::{Challenge, ChallengeStatus};
use crate::utils::date::format_two_units;

pub use urgency::{UrgencyThresholds, UrgencyTier};

/// Classifies a challenge relative to `now`.
///
/// Rules apply in priority order: completion, then release, then expiry.
/// Both the release and end instants count as active.
pub fn classify(challenge: &Challenge, now: DateTime<Utc>) -> ChallengeStatus {
    if challenge.is_completed {
        ChallengeStatus::Completed
    } else if now < challenge.release_time {
        ChallengeStatus::Upcoming
    } else if !challenge.challenge_type.is_permanent() && now > challenge.end_time {
        ChallengeStatus::Expired
    } else {
        ChallengeStatus::Active
    }
}

/// What the countdown is counting towards, with the remaining time clamped at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownKind {
    Completed,
    StartsIn(Duration),
    EndsIn(Duration),
    AlwaysOpen,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub status: ChallengeStatus,
    pub kind: CountdownKind,
    /// `Normal` unless the challenge is active with an end time approaching.
    pub urgency: UrgencyTier,
}

impl Countdown {
    pub fn remaining(&self) -> Option<Duration> {
        match self.kind {
            CountdownKind::StartsIn(left) | CountdownKind::EndsIn(left) => Some(left),
            _ => None,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CountdownKind::Completed => f.write_str("completed"),
            CountdownKind::StartsIn(left) => write!(f, "starts in {}", format_two_units(left)),
            CountdownKind::EndsIn(left) => write!(f, "ends in {}", format_two_units(left)),
            CountdownKind::AlwaysOpen => f.write_str("always open"),
            CountdownKind::Expired => f.write_str("expired"),
        }
    }
}

/// Countdown using the default urgency thresholds.
pub fn countdown(challenge: &Challenge, now: DateTime<Utc>) -> Countdown {
    countdown_with(challenge, now, &UrgencyThresholds::default())
}

pub fn countdown_with(
    challenge: &Challenge,
    now: DateTime<Utc>,
    thresholds: &UrgencyThresholds,
) -> Countdown {
    let status = classify(challenge, now);

    let (kind, urgency) = match status {
        ChallengeStatus::Completed => (CountdownKind::Completed, UrgencyTier::Normal),
        ChallengeStatus::Expired => (CountdownKind::Expired, UrgencyTier::Normal),
        ChallengeStatus::Upcoming => (
            CountdownKind::StartsIn(clamp_non_negative(challenge.release_time - now)),
            UrgencyTier::Normal,
        ),
        ChallengeStatus::Active if challenge.challenge_type.is_permanent() => {
            (CountdownKind::AlwaysOpen, UrgencyTier::Normal)
        }
        ChallengeStatus::Active => {
            let left = clamp_non_negative(challenge.end_time - now);
            (CountdownKind::EndsIn(left), thresholds.tier_for(left))
        }
    };

    Countdown {
        status,
        kind,
        urgency,
    }
}

fn clamp_non_negative(duration: Duration) -> Duration {
    duration.max(Duration::zero())
}
