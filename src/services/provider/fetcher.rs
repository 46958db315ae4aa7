use std::thread;
use std::time::Duration;

use anyhow::Result;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::models::event::{Event, EventSummary};
use crate::models::settings::ProviderSettings;

use super::error::ProviderError;
use super::ChallengeSource;

/// Blocking client for the platform's event endpoints.
pub struct HttpChallengeSource {
    client: Client,
    base_url: String,
    token: Option<String>,
    max_response_bytes: usize,
    max_retries: usize,
    retry_delay: Duration,
}

impl HttpChallengeSource {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let base_url = settings.base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("https://") && !settings.allow_insecure_http {
            return Err(ProviderError::InsecureUrl(base_url).into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds.max(1)))
            .build()
            .map_err(ProviderError::Client)?;

        Ok(Self {
            client,
            base_url,
            token: settings
                .token
                .as_deref()
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string),
            max_response_bytes: settings.max_response_bytes,
            max_retries: settings.max_retries,
            retry_delay: Duration::from_millis(settings.retry_delay_millis),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let mut attempt = 0;
        loop {
            let result = self
                .fetch_once(url)
                .and_then(|bytes| decode_payload(url, &bytes));

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    log::warn!("Fetch attempt {} failed for {}: {}", attempt, url, err);
                    thread::sleep(self.retry_delay);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn fetch_once(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().map_err(|source| ProviderError::Network {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProviderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_bytes {
                return Err(ProviderError::TooLarge {
                    url: url.to_string(),
                    size: content_length as usize,
                    limit: self.max_response_bytes,
                });
            }
        }

        let bytes = response.bytes().map_err(|source| ProviderError::Network {
            url: url.to_string(),
            source,
        })?;

        if bytes.len() > self.max_response_bytes {
            return Err(ProviderError::TooLarge {
                url: url.to_string(),
                size: bytes.len(),
                limit: self.max_response_bytes,
            });
        }

        Ok(bytes.to_vec())
    }
}

impl ChallengeSource for HttpChallengeSource {
    fn fetch_event(&self, event_id: i64) -> Result<Event> {
        let url = self.endpoint(&format!("events/{}", event_id));
        let event: Event = self.get_json(&url)?;

        for problem in event.invalid_challenges() {
            log::warn!("Event {}: {}", event_id, problem);
        }

        log::info!(
            "Fetched event {} ({} challenges)",
            event_id,
            event.challenges.len()
        );
        Ok(event)
    }

    fn list_events(&self) -> Result<Vec<EventSummary>> {
        let url = self.endpoint("events");
        let events: Vec<EventSummary> = self.get_json(&url)?;
        log::info!("Fetched {} events", events.len());
        Ok(events)
    }
}

fn decode_payload<T: DeserializeOwned>(url: &str, bytes: &[u8]) -> Result<T, ProviderError> {
    serde_json::from_slice(bytes).map_err(|source| ProviderError::Malformed {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str) -> ProviderSettings {
        ProviderSettings {
            base_url: base_url.to_string(),
            ..ProviderSettings::default()
        }
    }

    #[test]
    fn test_rejects_plain_http() {
        let err = HttpChallengeSource::new(&settings("http://localhost:8080/api")).err().unwrap();
        assert!(err.to_string().contains("HTTPS"));
    }

    #[test]
    fn test_allows_plain_http_when_opted_in() {
        let mut local = settings("http://localhost:8080/api");
        local.allow_insecure_http = true;
        assert!(HttpChallengeSource::new(&local).is_ok());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let source = HttpChallengeSource::new(&settings("https://games.example.org/api/")).unwrap();
        assert_eq!(source.base_url(), "https://games.example.org/api");
        assert_eq!(source.endpoint("events/3"), "https://games.example.org/api/events/3");
        assert_eq!(source.endpoint("/events"), "https://games.example.org/api/events");
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let mut with_blank = settings("https://games.example.org/api");
        with_blank.token = Some("   ".to_string());
        let source = HttpChallengeSource::new(&with_blank).unwrap();
        assert!(source.token.is_none());
    }

    #[test]
    fn test_decode_payload_reports_malformed_json() {
        let err = decode_payload::<Event>("https://x/events/1", br#"{"id": "one"}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_decode_payload_event() {
        let body = br#"{
            "id": 9,
            "name": "Night Shift",
            "startTime": "2025-10-01T18:00:00Z",
            "endTime": "2025-10-02T06:00:00Z",
            "challenges": []
        }"#;
        let event: Event = decode_payload("https://x/events/9", body).unwrap();
        assert_eq!(event.name, "Night Shift");
    }
}
