//! Terminal rendering for the event board and the event list.
//!
//! Urgency tiers and statuses map to ANSI colors here and only here; the
//! status engine hands over data values, never colors.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::models::challenge::ChallengeStatus;
use crate::models::event::{EventPhase, EventSummary};
use crate::services::board::{ChallengeRow, EventBoard, StatusFilter};
use crate::services::status::UrgencyTier;
use crate::utils::date::{format_instant, format_two_units};

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub filter: StatusFilter,
    pub tz: Option<Tz>,
    pub color: bool,
}

fn paint(text: &str, code: &str, color: bool) -> String {
    if color {
        format!("{}{}{}", code, text, RESET)
    } else {
        text.to_string()
    }
}

fn row_color(row: &ChallengeRow) -> &'static str {
    match (row.status, row.countdown.urgency) {
        (ChallengeStatus::Active, UrgencyTier::Critical) => RED,
        (ChallengeStatus::Active, UrgencyTier::Warning) => YELLOW,
        (ChallengeStatus::Active, UrgencyTier::Normal) => GREEN,
        (ChallengeStatus::Upcoming, _) => CYAN,
        (ChallengeStatus::Completed, _) | (ChallengeStatus::Expired, _) => DIM,
    }
}

fn phase_label(phase: EventPhase) -> &'static str {
    match phase {
        EventPhase::NotStarted => "not started",
        EventPhase::Running => "running",
        EventPhase::Ended => "ended",
    }
}

pub fn render_board(board: &EventBoard, now: DateTime<Utc>, options: &RenderOptions) -> String {
    let mut out = String::new();

    let Some(event) = board.event() else {
        let _ = writeln!(out, "Loading event {}...", board.event_id());
        if let Some(error) = board.last_error() {
            let _ = writeln!(out, "{}", paint(&format!("Error: {}", error), RED, options.color));
            let _ = writeln!(out, "Press Enter to retry.");
        }
        return out;
    };

    let progress = board.progress(now);
    let _ = writeln!(
        out,
        "{}  [{}]  {} - {}",
        paint(&event.name, BOLD, options.color),
        phase_label(event.phase(now)),
        format_instant(event.start_time, options.tz),
        format_instant(event.end_time, options.tz)
    );
    let _ = writeln!(
        out,
        "{}/{} completed, {}/{} points  |  {} active, {} upcoming, {} expired",
        progress.completed,
        progress.total,
        progress.earned_points,
        progress.total_points,
        progress.active,
        progress.upcoming,
        progress.expired
    );

    let rows = board.rows(now, options.filter);
    if rows.is_empty() {
        let _ = writeln!(out, "\nNo challenges to show.");
    } else {
        let _ = writeln!(
            out,
            "\n{:<10} {:<18} {:>6}  {:<10} {}",
            "STATUS", "COUNTDOWN", "POINTS", "TYPE", "CHALLENGE"
        );
        for row in &rows {
            let line = format!(
                "{:<10} {:<18} {:>6}  {:<10} {}",
                row.status.as_str(),
                row.countdown.to_string(),
                row.points,
                row.challenge_type.as_str(),
                row.title
            );
            let _ = writeln!(out, "{}", paint(&line, row_color(row), options.color));
        }
    }

    out.push('\n');
    match board.refresh_deadline() {
        Some(deadline) => {
            let _ = writeln!(
                out,
                "Next refresh in {} ({})",
                format_two_units(deadline - now),
                format_instant(deadline, options.tz)
            );
        }
        None => {
            let _ = writeln!(out, "No upcoming status changes.");
        }
    }

    if let Some(updated) = board.last_updated() {
        let _ = writeln!(out, "Updated {} ago", format_two_units(now - updated));
    }

    if let Some(error) = board.last_error() {
        let _ = writeln!(
            out,
            "{}",
            paint(&format!("Last refresh failed: {} (Enter to retry)", error), RED, options.color)
        );
    }

    out
}

pub fn render_event_list(events: &[EventSummary], now: DateTime<Utc>, tz: Option<Tz>) -> String {
    if events.is_empty() {
        return "No events.\n".to_string();
    }

    let mut sorted = events.iter().collect::<Vec<_>>();
    sorted.sort_by_key(|event| (event.start_time, event.id));

    let mut out = format!("{:>6}  {:<12} {:<17} {:<17} {}\n", "ID", "PHASE", "START", "END", "NAME");
    for event in sorted {
        let _ = writeln!(
            out,
            "{:>6}  {:<12} {:<17} {:<17} {}",
            event.id,
            phase_label(event.phase(now)),
            format_instant(event.start_time, tz),
            format_instant(event.end_time, tz),
            event.name
        );
    }
    out
}
