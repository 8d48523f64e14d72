//! Arguments and state shared by every store-backed command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::config::Settings;
use crate::data::yaml::{render, OutputFormat};
use crate::identity::ConfiguredIdentities;
use crate::store::MemoryStore;

/// Store and output options.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Path to the store file (defaults to $DEVPULSE_STORE or ~/.devpulse/store.json).
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Output format for reports.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
}

/// Settings, identities and the opened store.
pub struct Workspace {
    /// Loaded settings.
    pub settings: Settings,
    /// Identity directory built from the settings' profiles.
    pub identities: ConfiguredIdentities,
    /// Opened store.
    pub store: MemoryStore,
    format: OutputFormat,
}

impl StoreArgs {
    /// Loads settings and opens the store.
    pub fn open(&self) -> Result<Workspace> {
        let settings = Settings::load().context("Failed to load settings")?;
        let path = settings
            .store_path(self.store.as_deref())
            .context("Failed to resolve store path")?;
        debug!(path = %path.display(), "Opening store");

        let store = MemoryStore::open(&path)
            .with_context(|| format!("Failed to open store: {}", path.display()))?;
        let identities = ConfiguredIdentities::from_profiles(&settings.profiles);

        Ok(Workspace {
            settings,
            identities,
            store,
            format: self.format,
        })
    }
}

impl Workspace {
    /// Writes the store back to its file.
    pub fn save(&self) -> Result<()> {
        self.store.save().context("Failed to save store")
    }

    /// Prints a report to stdout in the selected format.
    pub fn print<T: Serialize>(&self, report: &T) -> Result<()> {
        print_report(report, self.format)
    }
}

/// Prints a report to stdout.
pub fn print_report<T: Serialize>(report: &T, format: OutputFormat) -> Result<()> {
    let rendered = render(report, format)?;
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Reporting period options.
#[derive(Args, Debug, Clone)]
pub struct PeriodArgs {
    /// First day of the period (inclusive).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub since: Option<NaiveDate>,

    /// Last day of the period (inclusive). Defaults to now.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub until: Option<NaiveDate>,

    /// Days before `--until` when `--since` is not given.
    #[arg(long, default_value_t = 30)]
    pub days: i64,
}

impl PeriodArgs {
    /// Resolves the half-open `[from, to)` window.
    pub fn window(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let to = match self.until {
            Some(day) => day
                .checked_add_days(Days::new(1))
                .map(start_of)
                .with_context(|| format!("--until {day} is out of range"))?,
            None => now,
        };
        let from = match self.since {
            Some(day) => start_of(day),
            None => TimeDelta::try_days(self.days)
                .and_then(|span| to.checked_sub_signed(span))
                .with_context(|| format!("--days {} is out of range", self.days))?,
        };
        if from >= to {
            anyhow::bail!("Empty period: {from} is not before {to}");
        }
        Ok((from, to))
    }
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}
