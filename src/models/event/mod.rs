use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::challenge::Challenge;
use crate::utils::date::timestamp;

/// Where an event's own start/end window stands relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPhase {
    NotStarted,
    Running,
    Ended,
}

/// Entry of the provider's event listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: i64,
    pub name: String,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_time: DateTime<Utc>,
}

impl EventSummary {
    pub fn phase(&self, now: DateTime<Utc>) -> EventPhase {
        phase_of(self.start_time, self.end_time, now)
    }
}

/// A named collection of challenges bounded by a start/end window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

impl Event {
    pub fn phase(&self, now: DateTime<Utc>) -> EventPhase {
        phase_of(self.start_time, self.end_time, now)
    }

    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id,
            name: self.name.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    /// Collects validation messages for challenges with impossible windows.
    pub fn invalid_challenges(&self) -> Vec<String> {
        self.challenges
            .iter()
            .filter_map(|challenge| challenge.validate().err())
            .collect()
    }
}

fn phase_of(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> EventPhase {
    if now < start {
        EventPhase::NotStarted
    } else if now > end {
        EventPhase::Ended
    } else {
        EventPhase::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event_json() -> &'static str {
        r#"{
            "id": 1,
            "name": "Spring Games",
            "startTime": "2025-04-01T00:00:00Z",
            "endTime": "2025-04-30T23:59:59Z",
            "challenges": [
                {
                    "id": 10,
                    "title": "Warm-up",
                    "releaseTime": "2025-04-01T00:00:00Z",
                    "endTime": "2025-04-02T00:00:00Z",
                    "type": "TEMPORARY",
                    "points": 10
                },
                {
                    "id": 11,
                    "releaseTime": "2025-04-05T00:00:00Z",
                    "endTime": "2025-04-03T00:00:00Z",
                    "type": "RACE"
                }
            ]
        }"#
    }

    #[test]
    fn test_event_deserializes_with_challenges() {
        let event: Event = serde_json::from_str(event_json()).unwrap();
        assert_eq!(event.name, "Spring Games");
        assert_eq!(event.description, None);
        assert_eq!(event.challenges.len(), 2);
        assert_eq!(event.summary().id, 1);
    }

    #[test]
    fn test_event_reports_inverted_windows() {
        let event: Event = serde_json::from_str(event_json()).unwrap();
        let invalid = event.invalid_challenges();
        assert_eq!(invalid.len(), 1);
        assert!(invalid[0].contains("Challenge 11"));
    }

    #[test]
    fn test_event_phase_boundaries_are_inclusive() {
        let event: Event = serde_json::from_str(event_json()).unwrap();
        let second = Duration::seconds(1);

        assert_eq!(event.phase(event.start_time - second), EventPhase::NotStarted);
        assert_eq!(event.phase(event.start_time), EventPhase::Running);
        assert_eq!(event.phase(event.end_time), EventPhase::Running);
        assert_eq!(event.phase(event.end_time + second), EventPhase::Ended);
    }

    #[test]
    fn test_summary_listing_deserializes() {
        let json = r#"[{"id": 4, "name": "Autumn", "startTime": "2025-09-01T00:00:00Z", "endTime": "2025-09-30T00:00:00Z"}]"#;
        let summaries: Vec<EventSummary> = serde_json::from_str(json).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        assert_eq!(summaries[0].phase(now), EventPhase::Ended);
    }
}
