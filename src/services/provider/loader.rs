use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

use crate::models::event::{Event, EventSummary};
use crate::services::cache::ResponseCache;
use crate::services::refresh::boundary_crossed;

use super::ChallengeSource;

const EVENT_LIST_KEY: &str = "events";

fn event_key(event_id: i64) -> String {
    format!("event:{}", event_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Cache,
    Provider,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedEvent {
    pub event: Event,
    pub origin: LoadOrigin,
    pub fetched_at: DateTime<Utc>,
}

/// Cache-aside reads of provider data.
pub struct EventLoader<'a, S> {
    source: S,
    cache: Option<ResponseCache<'a>>,
    ttl: Duration,
}

impl<'a, S: ChallengeSource> EventLoader<'a, S> {
    pub fn new(source: S, cache: Option<ResponseCache<'a>>, ttl: StdDuration) -> Self {
        Self {
            source,
            cache,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::zero()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fresh cached copy of the event, if any. A copy fetched before a
    /// status boundary that has since passed counts as a miss.
    pub fn cached_event(&self, event_id: i64, now: DateTime<Utc>) -> Result<Option<LoadedEvent>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };

        let Some(entry) = cache.get::<Event>(&event_key(event_id), now, self.ttl)? else {
            return Ok(None);
        };

        if boundary_crossed(&entry.value.challenges, entry.fetched_at, now) {
            log::debug!("Cached event {} predates a status boundary; ignoring", event_id);
            return Ok(None);
        }

        log::debug!(
            "Cache hit for event {} (age {}s)",
            event_id,
            entry.age(now).num_seconds()
        );
        Ok(Some(LoadedEvent {
            event: entry.value,
            origin: LoadOrigin::Cache,
            fetched_at: entry.fetched_at,
        }))
    }

    /// Serves a fresh cache hit, otherwise fetches from the provider.
    pub fn load_event(&self, event_id: i64, now: DateTime<Utc>) -> Result<LoadedEvent> {
        if let Some(hit) = self.cached_event(event_id, now)? {
            return Ok(hit);
        }

        self.refresh_event(event_id, now)
    }

    /// Always fetches from the provider and replaces the cached copy.
    pub fn refresh_event(&self, event_id: i64, now: DateTime<Utc>) -> Result<LoadedEvent> {
        let event = self
            .source
            .fetch_event(event_id)
            .with_context(|| format!("Failed to load event {}", event_id))?;

        self.store_event(&event, now);

        Ok(LoadedEvent {
            event,
            origin: LoadOrigin::Provider,
            fetched_at: now,
        })
    }

    /// Writes an event fetched elsewhere (e.g. on a worker thread) into the cache.
    /// Cache failures are logged, never surfaced: the fetched data is still good.
    pub fn store_event(&self, event: &Event, fetched_at: DateTime<Utc>) {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.put(&event_key(event.id), event, fetched_at) {
                log::warn!("Failed to cache event {}: {:#}", event.id, err);
            }
        }
    }

    pub fn list_events(&self, now: DateTime<Utc>) -> Result<Vec<EventSummary>> {
        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.get::<Vec<EventSummary>>(EVENT_LIST_KEY, now, self.ttl)? {
                return Ok(entry.value);
            }
        }

        let events = self
            .source
            .list_events()
            .context("Failed to list events")?;

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.put(EVENT_LIST_KEY, &events, now) {
                log::warn!("Failed to cache event list: {:#}", err);
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::challenge::{Challenge, ChallengeType};
    use crate::services::database::Database;
    use crate::services::provider::MockChallengeSource;
    use chrono::TimeZone;
    use mockall::predicate::eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn event(id: i64) -> Event {
        Event {
            id,
            name: format!("Event {}", id),
            description: Some("desc".to_string()),
            start_time: now() - Duration::days(1),
            end_time: now() + Duration::days(1),
            challenges: Vec::new(),
        }
    }

    fn db() -> Database {
        let db = Database::new(":memory:").unwrap();
        db.initialize_schema().unwrap();
        db
    }

    #[test]
    fn load_fetches_once_then_serves_cache() {
        let db = db();
        let mut source = MockChallengeSource::new();
        source
            .expect_fetch_event()
            .with(eq(4))
            .times(1)
            .returning(|id| Ok(event(id)));

        let loader = EventLoader::new(
            source,
            Some(ResponseCache::new(db.connection())),
            StdDuration::from_secs(300),
        );

        let first = loader.load_event(4, now()).unwrap();
        assert_eq!(first.origin, LoadOrigin::Provider);

        let second = loader.load_event(4, now() + Duration::seconds(60)).unwrap();
        assert_eq!(second.origin, LoadOrigin::Cache);
        assert_eq!(second.event, first.event);
        assert_eq!(second.fetched_at, now());
    }

    #[test]
    fn load_refetches_after_ttl() {
        let db = db();
        let mut source = MockChallengeSource::new();
        source.expect_fetch_event().times(2).returning(|id| Ok(event(id)));

        let loader = EventLoader::new(
            source,
            Some(ResponseCache::new(db.connection())),
            StdDuration::from_secs(300),
        );

        loader.load_event(4, now()).unwrap();
        let later = loader.load_event(4, now() + Duration::seconds(300)).unwrap();
        assert_eq!(later.origin, LoadOrigin::Provider);
    }

    #[test]
    fn refresh_bypasses_fresh_cache() {
        let db = db();
        let mut source = MockChallengeSource::new();
        source.expect_fetch_event().times(2).returning(|id| Ok(event(id)));

        let loader = EventLoader::new(
            source,
            Some(ResponseCache::new(db.connection())),
            StdDuration::from_secs(300),
        );

        loader.load_event(4, now()).unwrap();
        let refreshed = loader.refresh_event(4, now() + Duration::seconds(1)).unwrap();
        assert_eq!(refreshed.origin, LoadOrigin::Provider);
        assert_eq!(
            loader.cached_event(4, now() + Duration::seconds(2)).unwrap().unwrap().fetched_at,
            now() + Duration::seconds(1)
        );
    }

    #[test]
    fn without_cache_every_load_fetches() {
        let mut source = MockChallengeSource::new();
        source.expect_fetch_event().times(2).returning(|id| Ok(event(id)));

        let loader = EventLoader::new(source, None, StdDuration::from_secs(300));
        loader.load_event(1, now()).unwrap();
        loader.load_event(1, now()).unwrap();
        assert!(loader.cached_event(1, now()).unwrap().is_none());
    }

    #[test]
    fn provider_errors_carry_context() {
        let mut source = MockChallengeSource::new();
        source
            .expect_fetch_event()
            .returning(|_| Err(anyhow::anyhow!("HTTP status 503")));

        let loader = EventLoader::new(source, None, StdDuration::from_secs(300));
        let err = loader.load_event(8, now()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to load event 8");
        assert!(format!("{:#}", err).contains("503"));
    }

    #[test]
    fn event_list_is_cached() {
        let db = db();
        let mut source = MockChallengeSource::new();
        source
            .expect_list_events()
            .times(1)
            .returning(|| Ok(vec![event(1).summary(), event(2).summary()]));

        let loader = EventLoader::new(
            source,
            Some(ResponseCache::new(db.connection())),
            StdDuration::from_secs(60),
        );

        assert_eq!(loader.list_events(now()).unwrap().len(), 2);
        assert_eq!(loader.list_events(now() + Duration::seconds(30)).unwrap().len(), 2);
    }

    #[test]
    fn cache_fetched_before_boundary_is_a_miss() {
        let db = db();
        let mut source = MockChallengeSource::new();
        source.expect_fetch_event().times(2).returning(|id| {
            let mut event = event(id);
            event.challenges.push(Challenge {
                id: 1,
                title: "Opens soon".to_string(),
                release_time: now() + Duration::seconds(30),
                end_time: now() + Duration::hours(1),
                challenge_type: ChallengeType::Race,
                is_completed: false,
                points: 5,
            });
            Ok(event)
        });

        let loader = EventLoader::new(
            source,
            Some(ResponseCache::new(db.connection())),
            StdDuration::from_secs(300),
        );

        loader.load_event(4, now()).unwrap();
        assert!(loader.cached_event(4, now() + Duration::seconds(29)).unwrap().is_some());
        assert!(loader.cached_event(4, now() + Duration::seconds(30)).unwrap().is_none());

        let reloaded = loader.load_event(4, now() + Duration::seconds(31)).unwrap();
        assert_eq!(reloaded.origin, LoadOrigin::Provider);
    }
}
