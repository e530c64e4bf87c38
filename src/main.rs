mod cache;
mod commands;
mod config;
mod logging;
mod sofascore;

use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::sofascore::{Fetcher, SofascoreClient};

#[derive(Parser, Debug)]
#[command(name = "sofascore")]
#[command(about = "Browse SofaScore events and match statistics from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./sofascore.yaml or $XDG_CONFIG_HOME/sofascore/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Sport to query instead of the configured default
  #[arg(short, long, global = true)]
  sport: Option<String>,

  /// Bypass the local response cache
  #[arg(long, global = true)]
  no_cache: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List events currently in progress
  Live {
    /// Prompt for one of the listed events and show its statistics
    #[arg(long)]
    stats: bool,
  },
  /// List events scheduled on a day
  Day {
    /// Date as YYYY-MM-DD
    date: String,
  },
  /// List events scheduled today
  Today,
  /// List events scheduled tomorrow
  Tomorrow,
  /// List events for the coming days, starting today
  Next {
    #[arg(short, long, default_value_t = 3)]
    days: u32,
  },
  /// Show details of one event
  Event { id: u64 },
  /// Show statistics of one event
  Stats { id: u64 },
  /// Print the effective configuration
  Config,
}

fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if args.no_cache {
    config.cache.enabled = false;
  }

  let _guard = logging::init(&config.logging)?;

  let mut out = io::stdout().lock();

  match args.command {
    Command::Config => {
      let yaml = serde_yaml::to_string(&config)
        .map_err(|e| eyre!("Failed to serialize configuration: {}", e))?;
      write!(out, "{}", yaml)?;
    }
    command => {
      let client = SofascoreClient::from_config(&config)?;
      tracing::debug!(
        cache_enabled = config.cache.enabled,
        cache_dir = %config.cache.dir.display(),
        "client ready"
      );
      run(&client, command, args.sport.as_deref(), &mut out)?;
    }
  }

  Ok(())
}

fn run<F: Fetcher>(
  client: &SofascoreClient<F>,
  command: Command,
  sport: Option<&str>,
  out: &mut impl Write,
) -> Result<()> {
  match command {
    Command::Live { stats } => {
      let stdin = io::stdin();
      let mut input = stdin.lock();
      let picker = stats.then_some(&mut input as &mut dyn BufRead);
      commands::live(client, sport, picker, out)
    }
    Command::Day { date } => {
      let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| eyre!("Invalid date format: {}. Please use YYYY-MM-DD format.", date))?;
      commands::day(client, date, sport, out)
    }
    Command::Today => commands::day(client, Local::now().date_naive(), sport, out),
    Command::Tomorrow => {
      let tomorrow = Local::now().date_naive() + Duration::days(1);
      commands::day(client, tomorrow, sport, out)
    }
    Command::Next { days } => commands::next(client, Local::now().date_naive(), days, sport, out),
    Command::Event { id } => commands::event(client, id, out),
    Command::Stats { id } => commands::stats(client, id, out),
    Command::Config => Ok(()),
  }
}
