// Data provider access
// Read-only view of the platform's events and challenges

mod error;
mod fetcher;
mod loader;

use std::sync::Arc;

use anyhow::Result;

use crate::models::event::{Event, EventSummary};

pub use error::ProviderError;
pub use fetcher::HttpChallengeSource;
pub use loader::{EventLoader, LoadOrigin, LoadedEvent};

/// Where events and their challenges come from.
#[cfg_attr(test, mockall::automock)]
pub trait ChallengeSource {
    fn fetch_event(&self, event_id: i64) -> Result<Event>;

    fn list_events(&self) -> Result<Vec<EventSummary>>;
}

impl<T: ChallengeSource + ?Sized> ChallengeSource for Arc<T> {
    fn fetch_event(&self, event_id: i64) -> Result<Event> {
        (**self).fetch_event(event_id)
    }

    fn list_events(&self) -> Result<Vec<EventSummary>> {
        (**self).list_events()
    }
}

impl<T: ChallengeSource + ?Sized> ChallengeSource for &T {
    fn fetch_event(&self, event_id: i64) -> Result<Event> {
        (**self).fetch_event(event_id)
    }

    fn list_events(&self) -> Result<Vec<EventSummary>> {
        (**self).list_events()
    }
}
