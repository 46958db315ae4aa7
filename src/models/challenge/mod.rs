use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::date::timestamp;

/// How a challenge's visibility window behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeType {
    Temporary,
    /// Stays open forever once released; the end time is ignored.
    Permanent,
    Race,
}

impl ChallengeType {
    pub fn is_permanent(self) -> bool {
        matches!(self, ChallengeType::Permanent)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeType::Temporary => "TEMPORARY",
            ChallengeType::Permanent => "PERMANENT",
            ChallengeType::Race => "RACE",
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A challenge as returned by the data provider. Read-only on this side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(with = "timestamp")]
    pub release_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub points: u32,
}

impl Challenge {
    /// Reports windows the provider should never send. Nothing is repaired:
    /// classification still applies its rules literally to such records.
    pub fn validate(&self) -> Result<(), String> {
        if !self.challenge_type.is_permanent() && self.end_time < self.release_time {
            return Err(format!(
                "Challenge {} ends ({}) before it is released ({})",
                self.id,
                self.end_time.to_rfc3339(),
                self.release_time.to_rfc3339()
            ));
        }

        Ok(())
    }

    /// Title for display, falling back to the id when the provider sent none.
    pub fn display_title(&self) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            format!("Challenge #{}", self.id)
        } else {
            title.to_string()
        }
    }
}

/// Derived temporal state of a challenge. Recomputed on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Upcoming,
    Active,
    Completed,
    Expired,
}

impl ChallengeStatus {
    pub const ALL: [ChallengeStatus; 4] = [
        ChallengeStatus::Upcoming,
        ChallengeStatus::Active,
        ChallengeStatus::Completed,
        ChallengeStatus::Expired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeStatus::Upcoming => "upcoming",
            ChallengeStatus::Active => "active",
            ChallengeStatus::Completed => "completed",
            ChallengeStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == needle)
            .ok_or_else(|| {
                format!(
                    "Unknown challenge status '{}' (expected upcoming, active, completed or expired)",
                    value
                )
            })
    }
}
