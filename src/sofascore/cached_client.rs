//! SofaScore client that wraps a fetcher with transparent caching.

use chrono::{Duration, NaiveDate};
use color_eyre::Result;
use serde_json::Value;
use std::sync::Arc;

use crate::cache::{CacheStore, CachedOperation, CallArgs};
use crate::config::{Config, MaxAgeConfig};

use super::api_types::parse_events;
use super::client::{Fetcher, HttpFetcher};
use super::error::FetchError;
use super::retry::{RetryPolicy, Retrying};
use super::types::Event;

/// SofaScore client with transparent caching support.
///
/// List queries treat an unreachable or rejecting upstream as "no events";
/// single-event lookups report those failures to the caller.
pub struct SofascoreClient<F> {
  fetcher: F,
  default_sport: String,
  events_for_day: CachedOperation,
  live_events: CachedOperation,
  event: CachedOperation,
  event_stats: CachedOperation,
}

impl SofascoreClient<Retrying<HttpFetcher>> {
  /// Build the production client: HTTP, retried, cached as configured.
  pub fn from_config(config: &Config) -> Result<Self> {
    let fetcher = Retrying::new(
      HttpFetcher::new(&config.api)?,
      RetryPolicy::from_config(&config.api),
    );
    let store = Arc::new(CacheStore::open(&config.cache));

    Ok(Self::new(
      fetcher,
      store,
      &config.cache.max_age,
      &config.default_sport,
    ))
  }
}

impl<F: Fetcher> SofascoreClient<F> {
  pub fn new(
    fetcher: F,
    store: Arc<CacheStore>,
    max_age: &MaxAgeConfig,
    default_sport: &str,
  ) -> Self {
    let op = |name: &'static str, secs: u64| {
      CachedOperation::new(name, seconds(secs), Arc::clone(&store))
    };

    Self {
      events_for_day: op("list_events_for_day", max_age.events_for_day),
      live_events: op("list_live_events", max_age.live_events),
      event: op("fetch_event", max_age.event),
      event_stats: op("fetch_event_stats", max_age.event_stats),
      fetcher,
      default_sport: default_sport.to_string(),
    }
  }

  /// All events scheduled on `day` for `sport` (default sport when `None`).
  pub fn list_events_for_day(
    &self,
    day: NaiveDate,
    sport: Option<&str>,
  ) -> std::result::Result<Vec<Event>, FetchError> {
    let sport = sport.unwrap_or(self.default_sport.as_str());
    let day = day.format("%Y-%m-%d").to_string();
    let path = format!("/sport/{}/events/date/{}", sport, day);
    let args = CallArgs::new().arg(&day).kwarg("sport", sport);

    let payload = self.events_for_day.call(&args, || self.fetcher.get(&path));
    match or_empty(payload, &format!("events for {}", day))? {
      Some(payload) => parse_events(payload, &path),
      None => Ok(Vec::new()),
    }
  }

  /// Events currently in progress for `sport` (default sport when `None`).
  pub fn list_live_events(
    &self,
    sport: Option<&str>,
  ) -> std::result::Result<Vec<Event>, FetchError> {
    let sport = sport.unwrap_or(self.default_sport.as_str());
    let path = format!("/sport/{}/events/live", sport);
    let args = CallArgs::new().kwarg("sport", sport);

    let payload = self.live_events.call(&args, || self.fetcher.get(&path));
    match or_empty(payload, "live events")? {
      Some(payload) => parse_events(payload, &path),
      None => Ok(Vec::new()),
    }
  }

  /// Full payload of a single event.
  pub fn fetch_event(&self, event_id: u64) -> std::result::Result<Value, FetchError> {
    let path = format!("/event/{}", event_id);
    self
      .event
      .call(&CallArgs::new().arg(event_id), || self.fetcher.get(&path))
  }

  /// Statistics payload of a single event.
  pub fn fetch_event_stats(&self, event_id: u64) -> std::result::Result<Value, FetchError> {
    let path = format!("/event/{}/statistics", event_id);
    self
      .event_stats
      .call(&CallArgs::new().arg(event_id), || self.fetcher.get(&path))
  }
}

fn seconds(secs: u64) -> Duration {
  Duration::seconds(secs.min(u64::from(u32::MAX)) as i64)
}

/// Turn an unavailable upstream into "no payload" for list queries.
///
/// Anything that is not a network-level or HTTP failure is passed through.
fn or_empty(
  result: std::result::Result<Value, FetchError>,
  what: &str,
) -> std::result::Result<Option<Value>, FetchError> {
  match result {
    Ok(payload) => Ok(Some(payload)),
    Err(e @ FetchError::Rejected { .. }) => {
      tracing::warn!(status = ?e.status(), error = %e, "could not fetch {}; returning empty list", what);
      Ok(None)
    }
    Err(e @ FetchError::Transient { .. }) => {
      tracing::error!(error = %e, "network error fetching {}; returning empty list", what);
      Ok(None)
    }
    Err(e) => Err(e),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{FileStorage, ManualClock};
  use crate::sofascore::testing::MockFetcher;
  use serde_json::json;
  use std::path::Path;
  use std::time::Duration as StdDuration;

  fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
  }

  fn listing() -> Value {
    json!({
      "events": [{
        "id": 11,
        "slug": "arsenal-chelsea",
        "tournament": {"name": "Premier League"},
        "homeTeam": {"id": 1, "name": "Arsenal"},
        "awayTeam": {"id": 2, "name": "Chelsea"},
        "startTimestamp": 1714564800
      }]
    })
  }

  fn store(dir: &Path) -> Arc<CacheStore> {
    Arc::new(CacheStore::new(
      FileStorage::open(dir).unwrap(),
      ManualClock::new(),
    ))
  }

  /// Client over `mock` with three attempts and no delay, like production.
  fn client<'a>(
    mock: &'a MockFetcher,
    store: Arc<CacheStore>,
  ) -> SofascoreClient<Retrying<&'a MockFetcher>> {
    SofascoreClient::new(
      Retrying::new(mock, RetryPolicy::new(3, StdDuration::ZERO)),
      store,
      &MaxAgeConfig::default(),
      "football",
    )
  }

  #[test]
  fn day_listing_requests_the_dated_path() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::always(|| Ok(listing()));
    let events = client(&mock, store(dir.path()))
      .list_events_for_day(day(), None)
      .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].home_team.name, "Arsenal");
    assert_eq!(mock.paths(), vec!["/sport/football/events/date/2024-05-01"]);
  }

  #[test]
  fn day_listing_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::always(|| Ok(listing()));
    let client = client(&mock, store(dir.path()));

    let first = client.list_events_for_day(day(), None).unwrap();
    let second = client.list_events_for_day(day(), Some("football")).unwrap();

    assert_eq!(first, second);
    assert_eq!(mock.calls(), 1);
  }

  #[test]
  fn sports_are_cached_separately() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::always(|| Ok(listing()));
    let client = client(&mock, store(dir.path()));

    client.list_events_for_day(day(), Some("football")).unwrap();
    client.list_events_for_day(day(), Some("tennis")).unwrap();

    assert_eq!(
      mock.paths(),
      vec![
        "/sport/football/events/date/2024-05-01",
        "/sport/tennis/events/date/2024-05-01",
      ]
    );
  }

  #[test]
  fn day_listing_rejected_returns_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::always(|| MockFetcher::rejected(404));
    let client = client(&mock, store(dir.path()));

    assert!(client.list_events_for_day(day(), None).unwrap().is_empty());
    assert_eq!(mock.calls(), 1);
  }

  #[test]
  fn day_listing_network_down_returns_empty_after_retries() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::always(MockFetcher::transient);
    let client = client(&mock, store(dir.path()));

    assert!(client.list_events_for_day(day(), None).unwrap().is_empty());
    assert_eq!(mock.calls(), 3);
  }

  #[test]
  fn empty_fallback_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::scripted(vec![MockFetcher::rejected(503), Ok(listing())]);
    let client = client(&mock, store(dir.path()));

    assert!(client.list_live_events(None).unwrap().is_empty());
    assert_eq!(client.list_live_events(None).unwrap().len(), 1);
    assert_eq!(mock.calls(), 2);
  }

  #[test]
  fn live_listing_rejected_returns_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::always(|| MockFetcher::rejected(500));
    let client = client(&mock, store(dir.path()));

    assert!(client.list_live_events(Some("basketball")).unwrap().is_empty());
    assert_eq!(mock.paths(), vec!["/sport/basketball/events/live"]);
  }

  #[test]
  fn malformed_listing_is_not_hidden() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::always(|| Ok(json!({"events": [{"id": "nope"}]})));
    let client = client(&mock, store(dir.path()));

    let err = client.list_events_for_day(day(), None).unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
  }

  #[test]
  fn unbuildable_request_is_neither_retried_nor_hidden() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::always(|| {
      Err(FetchError::Invalid {
        url: "not a url/sport/football/events/live".to_string(),
        reason: "relative URL without a base".to_string(),
      })
    });
    let client = client(&mock, store(dir.path()));

    let err = client.list_live_events(None).unwrap_err();
    assert!(matches!(err, FetchError::Invalid { .. }));
    assert_eq!(mock.calls(), 1);
  }

  #[test]
  fn single_event_rejection_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::always(|| MockFetcher::rejected(404));
    let client = client(&mock, store(dir.path()));

    let err = client.fetch_event(42).unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(mock.calls(), 1);
  }

  #[test]
  fn single_event_network_failure_propagates_after_retries() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::always(MockFetcher::transient);
    let client = client(&mock, store(dir.path()));

    assert!(client.fetch_event_stats(42).unwrap_err().is_transient());
    assert_eq!(mock.calls(), 3);
  }

  #[test]
  fn failed_lookup_is_retried_on_next_call() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::scripted(vec![
      MockFetcher::rejected(404),
      Ok(json!({"event": {"id": 42}})),
    ]);
    let client = client(&mock, store(dir.path()));

    client.fetch_event(42).unwrap_err();
    assert_eq!(client.fetch_event(42).unwrap(), json!({"event": {"id": 42}}));
    assert_eq!(client.fetch_event(42).unwrap(), json!({"event": {"id": 42}}));
    assert_eq!(mock.calls(), 2);
  }

  #[test]
  fn event_and_stats_do_not_share_entries() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockFetcher::scripted(vec![
      Ok(json!({"event": {"id": 7}})),
      Ok(json!({"statistics": []})),
    ]);
    let client = client(&mock, store(dir.path()));

    assert_eq!(client.fetch_event(7).unwrap(), json!({"event": {"id": 7}}));
    assert_eq!(client.fetch_event_stats(7).unwrap(), json!({"statistics": []}));
    assert_eq!(mock.paths(), vec!["/event/7", "/event/7/statistics"]);
  }

  #[test]
  fn disabled_cache_fetches_every_time() {
    let mock = MockFetcher::always(|| Ok(json!({"event": {"id": 1}})));
    let client = client(&mock, Arc::new(CacheStore::disabled()));

    client.fetch_event(1).unwrap();
    client.fetch_event(1).unwrap();

    assert_eq!(mock.calls(), 2);
  }

  #[test]
  fn client_builds_when_cache_dir_is_unusable() {
    let dir = tempfile::tempdir().unwrap();
    let not_a_dir = dir.path().join("not_a_dir");
    std::fs::write(&not_a_dir, b"plain file").unwrap();
    let mut config = Config::default();
    config.cache.dir = not_a_dir.join("cache");

    assert!(SofascoreClient::from_config(&config).is_ok());
  }
}
