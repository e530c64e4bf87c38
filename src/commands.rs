//! Text rendering for the CLI commands.

use chrono::{DateTime, Local, NaiveDate};
use color_eyre::Result;
use serde_json::Value;
use std::io::{BufRead, Write};

use crate::sofascore::{Event, Fetcher, SofascoreClient};

/// Events shown per day by `next` before the rest is summarised.
const NEXT_SAMPLE: usize = 5;

/// List live events. With `picker`, then ask which one to show statistics for.
pub fn live<F: Fetcher>(
  client: &SofascoreClient<F>,
  sport: Option<&str>,
  picker: Option<&mut dyn BufRead>,
  out: &mut impl Write,
) -> Result<()> {
  let events = client.list_live_events(sport)?;
  if events.is_empty() {
    writeln!(out, "No live events found.")?;
    return Ok(());
  }

  writeln!(out, "Found {} live events:\n", events.len())?;
  for (i, event) in events.iter().enumerate() {
    writeln!(out, "{}. {} vs {}", i + 1, event.home_team.name, event.away_team.name)?;
    writeln!(out, "   ID: {}", event.id)?;
    match &event.tournament.category {
      Some(category) => writeln!(out, "   Tournament: {} ({})", tournament_name(event), category)?,
      None => writeln!(out, "   Tournament: {}", tournament_name(event))?,
    }
    writeln!(out, "   Start time: {}", format_time(event.start_timestamp, "%Y-%m-%d %H:%M"))?;
    writeln!(out)?;
  }

  if let Some(input) = picker {
    if let Some(event_id) = pick_event(&events, input, out)? {
      stats(client, event_id, out)?;
    }
  }
  Ok(())
}

/// Prompt until the user picks a listed event by number or gives up.
///
/// An empty line or end of input means no selection.
fn pick_event(
  events: &[Event],
  input: &mut dyn BufRead,
  out: &mut impl Write,
) -> Result<Option<u64>> {
  let mut line = String::new();
  loop {
    write!(out, "Enter event number to view statistics (or press Enter to exit): ")?;
    out.flush()?;

    line.clear();
    if input.read_line(&mut line)? == 0 {
      return Ok(None);
    }
    let selection = line.trim();
    if selection.is_empty() {
      return Ok(None);
    }

    match selection.parse::<usize>() {
      Ok(n) if (1..=events.len()).contains(&n) => return Ok(Some(events[n - 1].id)),
      Ok(_) => writeln!(out, "Invalid selection. Please enter a valid event number.")?,
      Err(_) => writeln!(out, "Please enter a number.")?,
    }
  }
}

pub fn day<F: Fetcher>(
  client: &SofascoreClient<F>,
  day: NaiveDate,
  sport: Option<&str>,
  out: &mut impl Write,
) -> Result<()> {
  let events = client.list_events_for_day(day, sport)?;
  if events.is_empty() {
    writeln!(out, "No events found for {}.", day)?;
    return Ok(());
  }

  writeln!(out, "Found {} events for {}:", events.len(), day)?;
  for (tournament, group) in by_tournament(&events) {
    writeln!(out, "\n== {} ({} events) ==", tournament, group.len())?;
    for (i, event) in group.iter().enumerate() {
      writeln!(
        out,
        "{}. {} - {} vs {} (ID: {})",
        i + 1,
        format_time(event.start_timestamp, "%H:%M"),
        event.home_team.name,
        event.away_team.name,
        event.id
      )?;
    }
  }
  Ok(())
}

pub fn next<F: Fetcher>(
  client: &SofascoreClient<F>,
  from: NaiveDate,
  days: u32,
  sport: Option<&str>,
  out: &mut impl Write,
) -> Result<()> {
  for date in from.iter_days().take(days as usize) {
    let events = client.list_events_for_day(date, sport)?;
    let heading = date.format("%A, %B %d, %Y");
    if events.is_empty() {
      writeln!(out, "\n{}: No events scheduled.", heading)?;
      continue;
    }

    writeln!(out, "\n{}: {} events scheduled", heading, events.len())?;
    for (i, event) in events.iter().take(NEXT_SAMPLE).enumerate() {
      writeln!(
        out,
        "  {}. {} - {} vs {} ({})",
        i + 1,
        format_time(event.start_timestamp, "%H:%M"),
        event.home_team.name,
        event.away_team.name,
        tournament_name(event)
      )?;
    }
    if events.len() > NEXT_SAMPLE {
      writeln!(out, "  ... and {} more events", events.len() - NEXT_SAMPLE)?;
    }
  }
  Ok(())
}

pub fn event<F: Fetcher>(
  client: &SofascoreClient<F>,
  event_id: u64,
  out: &mut impl Write,
) -> Result<()> {
  let payload = client.fetch_event(event_id)?;
  let Some(event) = payload.get("event") else {
    writeln!(out, "Could not fetch details for event {}", event_id)?;
    return Ok(());
  };

  writeln!(
    out,
    "Event: {} vs {}",
    str_at(event, &["homeTeam", "name"]).unwrap_or("Unknown"),
    str_at(event, &["awayTeam", "name"]).unwrap_or("Unknown")
  )?;
  if let Some(status) = str_at(event, &["status", "description"]) {
    writeln!(out, "Status: {}", status)?;
  }
  if let (Some(home), Some(away)) = (event.get("homeScore"), event.get("awayScore")) {
    writeln!(
      out,
      "Score: {} - {}",
      home.get("current").and_then(Value::as_i64).unwrap_or(0),
      away.get("current").and_then(Value::as_i64).unwrap_or(0)
    )?;
  }
  if let Some(tournament) = str_at(event, &["tournament", "name"]) {
    let category = str_at(event, &["tournament", "category", "name"]).unwrap_or("");
    writeln!(out, "Tournament: {} ({})", tournament, category)?;
  }
  if let Some(venue) = str_at(event, &["venue", "name"]) {
    let city = str_at(event, &["venue", "city", "name"]).unwrap_or("");
    writeln!(out, "Venue: {}, {}", venue, city)?;
  }
  if let Some(ts) = event.get("startTimestamp").and_then(Value::as_i64) {
    writeln!(out, "Start time: {}", format_time(ts, "%Y-%m-%d %H:%M"))?;
  }
  Ok(())
}

pub fn stats<F: Fetcher>(
  client: &SofascoreClient<F>,
  event_id: u64,
  out: &mut impl Write,
) -> Result<()> {
  // The heading is best effort; the statistics are what was asked for.
  match client.fetch_event(event_id) {
    Ok(payload) => match payload.get("event") {
      Some(event) => writeln!(
        out,
        "Statistics for: {} vs {}",
        str_at(event, &["homeTeam", "name"]).unwrap_or("Home"),
        str_at(event, &["awayTeam", "name"]).unwrap_or("Away")
      )?,
      None => writeln!(out, "Statistics for event {}:", event_id)?,
    },
    Err(e) => {
      tracing::debug!(error = %e, event_id, "event details unavailable for stats heading");
      writeln!(out, "Statistics for event {}:", event_id)?;
    }
  }

  let payload = client.fetch_event_stats(event_id)?;
  let Some(periods) = payload.get("statistics").and_then(Value::as_array) else {
    writeln!(out, "No statistics available for this event.")?;
    return Ok(());
  };

  for period in periods {
    let period_name = period.get("period").or_else(|| period.get("name"));
    writeln!(
      out,
      "\n=== {} ===",
      period_name.and_then(Value::as_str).unwrap_or("General")
    )?;

    for group in array_at(period, "groups") {
      writeln!(
        out,
        "\n{}:",
        group.get("groupName").and_then(Value::as_str).unwrap_or("Stats")
      )?;
      for item in array_at(group, "statisticsItems") {
        writeln!(
          out,
          "  {}: {} - {}",
          item.get("name").and_then(Value::as_str).unwrap_or("Unknown"),
          display_value(item.get("home")),
          display_value(item.get("away"))
        )?;
      }
    }
  }
  Ok(())
}

/// Group events by tournament name, keeping first-seen order.
fn by_tournament(events: &[Event]) -> Vec<(&str, Vec<&Event>)> {
  let mut groups: Vec<(&str, Vec<&Event>)> = Vec::new();
  for event in events {
    let name = tournament_name(event);
    match groups.iter_mut().find(|(n, _)| *n == name) {
      Some((_, group)) => group.push(event),
      None => groups.push((name, vec![event])),
    }
  }
  groups
}

fn tournament_name(event: &Event) -> &str {
  if event.tournament.name.is_empty() {
    "Unknown"
  } else {
    &event.tournament.name
  }
}

fn format_time(timestamp: i64, format: &str) -> String {
  DateTime::from_timestamp(timestamp, 0)
    .map(|dt| dt.with_timezone(&Local).format(format).to_string())
    .unwrap_or_else(|| "unknown".to_string())
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
  path
    .iter()
    .try_fold(value, |v, key| v.get(key))
    .and_then(Value::as_str)
}

fn array_at<'a>(value: &'a Value, key: &str) -> &'a [Value] {
  value
    .get(key)
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or(&[])
}

fn display_value(value: Option<&Value>) -> String {
  match value {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Null) | None => "N/A".to_string(),
    Some(v) => v.to_string(),
  }
}
