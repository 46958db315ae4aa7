//! Computes when the challenge set next changes status, so the board can
//! re-fetch exactly once at that instant instead of polling the provider.

mod scheduler;
mod sequencer;

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use crate::models::challenge::Challenge;

pub use scheduler::RefreshScheduler;
pub use sequencer::{FetchTicket, RequestSequencer};

/// Time until any challenge crosses a status boundary, or `None` when every
/// challenge is stable until some external change (e.g. completion).
pub fn next_boundary(challenges: &[Challenge], now: DateTime<Utc>) -> Option<StdDuration> {
    challenges
        .iter()
        .filter_map(|challenge| boundary_candidate(challenge, now))
        .filter(|delta| *delta > Duration::zero())
        .min()
        .and_then(|delta| delta.to_std().ok())
}

/// True when some challenge changed status between `since` and `now`, i.e.
/// data fetched at `since` predates a boundary that has already passed.
pub fn boundary_crossed(challenges: &[Challenge], since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    next_boundary(challenges, since)
        .and_then(|delta| Duration::from_std(delta).ok())
        .and_then(|delta| since.checked_add_signed(delta))
        .is_some_and(|boundary| boundary <= now)
}

fn boundary_candidate(challenge: &Challenge, now: DateTime<Utc>) -> Option<Duration> {
    if now < challenge.release_time {
        Some(challenge.release_time - now)
    } else if !challenge.is_completed
        && !challenge.challenge_type.is_permanent()
        && now <= challenge.end_time
    {
        Some(challenge.end_time - now)
    } else {
        None
    }
}
