use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::settings::DisplaySettings;

/// Display hint derived from the time an active challenge has left.
/// Variants are ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyTier {
    Normal,
    Warning,
    Critical,
}

impl Default for UrgencyTier {
    fn default() -> Self {
        Self::Normal
    }
}

/// Remaining-time limits below which a challenge enters a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgencyThresholds {
    /// Strictly less than this remaining is `Warning` (default: 10 minutes)
    pub warning: Duration,
    /// Strictly less than this remaining is `Critical` (default: 1 minute)
    pub critical: Duration,
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self {
            warning: Duration::minutes(10),
            critical: Duration::minutes(1),
        }
    }
}

impl UrgencyThresholds {
    pub fn tier_for(&self, remaining: Duration) -> UrgencyTier {
        if remaining < self.critical {
            UrgencyTier::Critical
        } else if remaining < self.warning {
            UrgencyTier::Warning
        } else {
            UrgencyTier::Normal
        }
    }
}

impl From<&DisplaySettings> for UrgencyThresholds {
    fn from(display: &DisplaySettings) -> Self {
        // Clamp to about 31,000 years so Duration::seconds cannot overflow.
        let seconds = |value: u64| Duration::seconds(value.min(1_000_000_000_000) as i64);
        Self {
            warning: seconds(display.warning_seconds),
            critical: seconds(display.critical_seconds),
        }
    }
}
