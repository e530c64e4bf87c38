/// A team taking part in an event
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
  pub id: u64,
  pub name: String,
  pub slug: Option<String>,
}

/// Tournament an event belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tournament {
  pub name: String,
  pub category: Option<String>,
}

/// Scheduled or live event summary for list views
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
  pub id: u64,
  pub slug: String,
  pub tournament: Tournament,
  pub home_team: Team,
  pub away_team: Team,
  /// Kick-off as Unix seconds
  pub start_timestamp: i64,
}
