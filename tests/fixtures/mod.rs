// Test fixtures - reusable test data
// Provides consistent challenges and events across all test files
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};

use challenge_dashboard::models::challenge::{Challenge, ChallengeType};
use challenge_dashboard::models::event::Event;

/// Fixed reference instant: Mar 1, 2025 at 12:00 UTC
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Sample challenges, windows given relative to [`now`]
pub mod challenges {
    use super::*;

    pub fn build(
        id: i64,
        challenge_type: ChallengeType,
        release_offset: Duration,
        end_offset: Duration,
    ) -> Challenge {
        Challenge {
            id,
            title: format!("Challenge {}", id),
            release_time: now() + release_offset,
            end_time: now() + end_offset,
            challenge_type,
            is_completed: false,
            points: 10,
        }
    }

    /// Released an hour ago, ends in half an hour
    pub fn half_hour_left() -> Challenge {
        build(1, ChallengeType::Temporary, Duration::hours(-1), Duration::minutes(30))
    }

    /// Opens in ten seconds, runs for an hour
    pub fn opening_soon() -> Challenge {
        build(2, ChallengeType::Race, Duration::seconds(10), Duration::hours(1))
    }

    pub fn permanent() -> Challenge {
        build(3, ChallengeType::Permanent, Duration::days(-10), Duration::days(-9))
    }

    pub fn expired() -> Challenge {
        build(4, ChallengeType::Temporary, Duration::hours(-5), Duration::hours(-4))
    }

    pub fn completed() -> Challenge {
        let mut challenge = build(5, ChallengeType::Temporary, Duration::hours(-1), Duration::hours(1));
        challenge.is_completed = true;
        challenge.points = 50;
        challenge
    }
}

/// Sample events
pub mod events {
    use super::*;

    pub fn with_challenges(id: i64, challenges: Vec<Challenge>) -> Event {
        Event {
            id,
            name: format!("Event {}", id),
            description: Some("Fixture event".to_string()),
            start_time: now() - Duration::days(1),
            end_time: now() + Duration::days(7),
            challenges,
        }
    }

    pub fn mixed() -> Event {
        with_challenges(
            100,
            vec![
                challenges::half_hour_left(),
                challenges::opening_soon(),
                challenges::permanent(),
                challenges::expired(),
                challenges::completed(),
            ],
        )
    }

    /// No challenge changes status after [`now`]
    pub fn settled() -> Event {
        with_challenges(
            200,
            vec![challenges::permanent(), challenges::expired(), challenges::completed()],
        )
    }
}
