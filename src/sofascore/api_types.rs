//! Serde-deserializable types matching SofaScore API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;
use serde_json::Value;

use super::error::FetchError;
use super::types::{Event, Team, Tournament};

// ============================================================================
// Event listings
// ============================================================================

/// Body of the day and live listing endpoints.
///
/// Some endpoints name the list `events`, older ones `eventList`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiEventsResponse {
  pub events: Option<Vec<ApiEvent>>,
  #[serde(rename = "eventList")]
  pub event_list: Option<Vec<ApiEvent>>,
}

impl ApiEventsResponse {
  pub fn into_events(self) -> Vec<Event> {
    self
      .events
      .filter(|events| !events.is_empty())
      .or(self.event_list)
      .unwrap_or_default()
      .into_iter()
      .map(ApiEvent::into_event)
      .collect()
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
  pub id: u64,
  #[serde(default)]
  pub slug: String,
  #[serde(default)]
  pub tournament: Option<ApiTournament>,
  pub home_team: ApiTeam,
  pub away_team: ApiTeam,
  pub start_timestamp: i64,
}

impl ApiEvent {
  pub fn into_event(self) -> Event {
    Event {
      id: self.id,
      slug: self.slug,
      tournament: self.tournament.map(Into::into).unwrap_or_default(),
      home_team: self.home_team.into(),
      away_team: self.away_team.into(),
      start_timestamp: self.start_timestamp,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiTeam {
  pub id: u64,
  pub name: String,
  pub slug: Option<String>,
}

impl From<ApiTeam> for Team {
  fn from(team: ApiTeam) -> Self {
    Team {
      id: team.id,
      name: team.name,
      slug: team.slug,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiTournament {
  #[serde(default)]
  pub name: String,
  pub category: Option<ApiCategory>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCategory {
  pub name: String,
}

impl From<ApiTournament> for Tournament {
  fn from(t: ApiTournament) -> Self {
    Tournament {
      name: t.name,
      category: t.category.map(|c| c.name),
    }
  }
}

/// Parse a listing payload into events.
pub fn parse_events(payload: Value, context: &str) -> Result<Vec<Event>, FetchError> {
  serde_json::from_value::<ApiEventsResponse>(payload)
    .map(ApiEventsResponse::into_events)
    .map_err(|source| FetchError::Decode {
      context: context.to_string(),
      source,
    })
}
