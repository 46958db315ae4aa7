//! The event board: one logical view over a single event's challenges.
//!
//! Holds the latest accepted challenge set, derives rows on every tick, and
//! keeps the one pending boundary refresh in step with the data it shows.

use std::cmp::Ordering;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use crate::models::challenge::{Challenge, ChallengeStatus, ChallengeType};
use crate::models::event::Event;
use crate::services::refresh::{FetchTicket, RefreshScheduler, RequestSequencer};
use crate::services::status::{countdown_with, Countdown, UrgencyThresholds};

/// Which rows the board shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ChallengeStatus),
}

impl StatusFilter {
    pub fn matches(self, status: ChallengeStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

/// One rendered line of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRow {
    pub id: i64,
    pub title: String,
    pub challenge_type: ChallengeType,
    pub points: u32,
    pub release_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ChallengeStatus,
    pub countdown: Countdown,
}

/// Aggregate counts for the header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventProgress {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub upcoming: usize,
    pub expired: usize,
    pub earned_points: u64,
    pub total_points: u64,
}

pub struct EventBoard {
    event_id: i64,
    event: Option<Event>,
    scheduler: RefreshScheduler,
    sequencer: RequestSequencer,
    thresholds: UrgencyThresholds,
    last_error: Option<String>,
    last_updated: Option<DateTime<Utc>>,
}

impl EventBoard {
    pub fn new(event_id: i64, scheduler: RefreshScheduler, thresholds: UrgencyThresholds) -> Self {
        Self {
            event_id,
            event: None,
            scheduler,
            sequencer: RequestSequencer::new(),
            thresholds,
            last_error: None,
            last_updated: None,
        }
    }

    pub fn event_id(&self) -> i64 {
        self.event_id
    }

    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    pub fn challenges(&self) -> &[Challenge] {
        self.event
            .as_ref()
            .map(|event| event.challenges.as_slice())
            .unwrap_or(&[])
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn refresh_deadline(&self) -> Option<DateTime<Utc>> {
        self.scheduler.deadline()
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    /// Issues the ticket a new fetch must carry back with its response.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        let ticket = self.sequencer.issue();
        log::debug!("Issued fetch {} for event {}", ticket, self.event_id);
        ticket
    }

    /// Applies a fetched event unless a newer fetch has been issued since.
    /// Returns whether the response was accepted.
    pub fn apply_response(&mut self, ticket: FetchTicket, event: Event, now: DateTime<Utc>) -> bool {
        if !self.sequencer.is_current(ticket) {
            log::debug!(
                "Discarding stale response {} for event {} (latest is {:?})",
                ticket,
                self.event_id,
                self.sequencer.latest()
            );
            return false;
        }

        if event.id != self.event_id {
            log::warn!(
                "Provider returned event {} while event {} was requested; ignoring",
                event.id,
                self.event_id
            );
            return false;
        }

        self.scheduler.reschedule(&event.challenges, now);
        self.event = Some(event);
        self.last_error = None;
        self.last_updated = Some(now);
        true
    }

    /// Records a failed fetch for display and re-arms the refresh with
    /// backoff. Failures of superseded fetches are dropped.
    pub fn apply_failure(
        &mut self,
        ticket: FetchTicket,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.sequencer.is_current(ticket) {
            return false;
        }

        let message = message.into();
        log::warn!("Fetch {} for event {} failed: {}", ticket, self.event_id, message);
        self.last_error = Some(message);

        let challenges: &[Challenge] = self.event.as_ref().map_or(&[], |event| event.challenges.as_slice());
        self.scheduler.schedule_retry(challenges, now);
        true
    }

    /// Shows an event obtained outside the fetch cycle (a cache hit or a
    /// one-shot load). Errors when the provider answered for another event.
    pub fn load_snapshot(&mut self, event: Event, now: DateTime<Utc>) -> Result<()> {
        let received = event.id;
        let ticket = self.begin_fetch();
        if !self.apply_response(ticket, event, now) {
            bail!(
                "Provider returned event {} while event {} was requested",
                received,
                self.event_id
            );
        }
        Ok(())
    }

    /// True once the boundary refresh is due; consumes the deadline.
    pub fn refresh_due(&mut self, now: DateTime<Utc>) -> bool {
        self.scheduler.take_due(now)
    }

    /// Cancels the pending boundary refresh; the board shows no further updates.
    pub fn teardown(&mut self) {
        self.scheduler.cancel();
    }

    pub fn rows(&self, now: DateTime<Utc>, filter: StatusFilter) -> Vec<ChallengeRow> {
        let mut rows = self
            .challenges()
            .iter()
            .map(|challenge| {
                let countdown = countdown_with(challenge, now, &self.thresholds);
                ChallengeRow {
                    id: challenge.id,
                    title: challenge.display_title(),
                    challenge_type: challenge.challenge_type,
                    points: challenge.points,
                    release_time: challenge.release_time,
                    end_time: challenge.end_time,
                    status: countdown.status,
                    countdown,
                }
            })
            .filter(|row| filter.matches(row.status))
            .collect::<Vec<_>>();

        rows.sort_by(compare_rows);
        rows
    }

    pub fn progress(&self, now: DateTime<Utc>) -> EventProgress {
        let mut progress = EventProgress::default();

        for challenge in self.challenges() {
            let points = u64::from(challenge.points);
            progress.total += 1;
            progress.total_points += points;

            match countdown_with(challenge, now, &self.thresholds).status {
                ChallengeStatus::Completed => {
                    progress.completed += 1;
                    progress.earned_points += points;
                }
                ChallengeStatus::Active => progress.active += 1,
                ChallengeStatus::Upcoming => progress.upcoming += 1,
                ChallengeStatus::Expired => progress.expired += 1,
            }
        }

        progress
    }
}

fn status_rank(status: ChallengeStatus) -> u8 {
    match status {
        ChallengeStatus::Active => 0,
        ChallengeStatus::Upcoming => 1,
        ChallengeStatus::Completed => 2,
        ChallengeStatus::Expired => 3,
    }
}

// Active rows soonest-ending first (permanent last), upcoming soonest-released first.
fn compare_rows(a: &ChallengeRow, b: &ChallengeRow) -> Ordering {
    let time_key = |row: &ChallengeRow| match row.status {
        ChallengeStatus::Active if row.challenge_type == ChallengeType::Permanent => None,
        ChallengeStatus::Active => Some(row.end_time),
        ChallengeStatus::Upcoming => Some(row.release_time),
        _ => None,
    };

    status_rank(a.status)
        .cmp(&status_rank(b.status))
        .then_with(|| match (time_key(a), time_key(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id.cmp(&b.id))
}
