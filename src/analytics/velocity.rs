//! Weekly velocity with a write-once snapshot cache and trend detection.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stats::{week_bounds, week_start_of};
use super::CategoryBreakdown;
use crate::data::{WeeklyVelocity, WeeklyVelocitySnapshot};
use crate::store::{AuthorFilter, CommitStore, IdentityResolver, SnapshotStore};

/// Default percent change separating `stable` from `up`/`down`.
pub const DEFAULT_TREND_THRESHOLD_PCT: f64 = 5.0;

/// Longest trend window, in weeks.
pub const MAX_TREND_WEEKS: usize = 520;

/// Direction of a week relative to the week before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// More commits than the previous week beyond the threshold.
    Up,
    /// Fewer commits than the previous week beyond the threshold.
    Down,
    /// Within the threshold.
    Stable,
}

/// One week of a velocity trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityMetrics {
    /// Aggregated values for the week.
    #[serde(flatten)]
    pub velocity: WeeklyVelocity,
    /// Direction relative to the previous week.
    pub trend: Trend,
    /// Percent change in commit count relative to the previous week.
    pub change_pct: f64,
}

/// Computes and caches weekly velocity per profile or for the whole team.
///
/// The snapshot store is the cache: a week is computed from raw commits the
/// first time it is requested and read back from the store afterwards.
pub struct VelocityEngine<'a, C, S, R> {
    commits: &'a C,
    snapshots: &'a S,
    identities: &'a R,
    trend_threshold_pct: f64,
}

impl<'a, C, S, R> VelocityEngine<'a, C, S, R>
where
    C: CommitStore,
    S: SnapshotStore,
    R: IdentityResolver,
{
    /// Creates an engine over the given stores.
    pub fn new(commits: &'a C, snapshots: &'a S, identities: &'a R) -> Self {
        Self {
            commits,
            snapshots,
            identities,
            trend_threshold_pct: DEFAULT_TREND_THRESHOLD_PCT,
        }
    }

    /// Overrides the trend threshold percentage.
    pub fn with_trend_threshold(mut self, pct: f64) -> Self {
        self.trend_threshold_pct = pct;
        self
    }

    /// Aggregates commits in `[week_start, week_start + 7 days)`.
    ///
    /// `profile_id = None` covers every author. A profile without any
    /// resolved email yields an empty week.
    pub fn calculate_weekly_velocity(
        &self,
        profile_id: Option<&str>,
        week_start: NaiveDate,
    ) -> Result<WeeklyVelocity> {
        let emails: Option<BTreeSet<String>> = profile_id.map(|id| {
            self.identities
                .emails_for_profile(id)
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect()
        });

        let filter = match &emails {
            None => AuthorFilter::Any,
            Some(set) if set.is_empty() => {
                debug!(profile = ?profile_id, "Profile has no emails, velocity is empty");
                return Ok(WeeklyVelocity::empty(week_start));
            }
            Some(set) => AuthorFilter::Emails(set),
        };

        let (from, to) = week_bounds(week_start);
        let rows = self
            .commits
            .commits_between(from, to, filter)
            .with_context(|| format!("Failed to load commits for week {week_start}"))?;

        let mut velocity = WeeklyVelocity::empty(week_start);
        for row in &rows {
            velocity.commits += 1;
            velocity.additions += row.additions;
            velocity.deletions += row.deletions;
            velocity.files_changed += row.files_changed;
        }
        velocity.breakdown = rows.iter().map(|r| r.category).collect::<CategoryBreakdown>();

        Ok(velocity)
    }

    /// Returns a week from the cache, computing and storing it on a miss.
    pub fn cached_weekly_velocity(
        &self,
        profile_id: Option<&str>,
        week_start: NaiveDate,
    ) -> Result<WeeklyVelocity> {
        if let Some(snapshot) = self
            .snapshots
            .snapshot(profile_id, week_start)
            .context("Failed to read velocity snapshot")?
        {
            debug!(profile = ?profile_id, %week_start, "Velocity snapshot hit");
            return Ok(snapshot.velocity);
        }

        let velocity = self.calculate_weekly_velocity(profile_id, week_start)?;
        self.snapshots
            .put_snapshot(WeeklyVelocitySnapshot {
                profile_id: profile_id.map(str::to_string),
                velocity: velocity.clone(),
            })
            .context("Failed to write velocity snapshot")?;
        debug!(profile = ?profile_id, %week_start, commits = velocity.commits, "Velocity snapshot stored");

        Ok(velocity)
    }

    /// Returns `weeks` consecutive weeks ending with the current one, oldest first.
    pub fn velocity_trend(&self, profile_id: Option<&str>, weeks: usize) -> Result<Vec<VelocityMetrics>> {
        self.velocity_trend_at(profile_id, weeks, Utc::now())
    }

    /// Like [`Self::velocity_trend`] with an explicit clock. Windows longer
    /// than [`MAX_TREND_WEEKS`] are rejected.
    pub fn velocity_trend_at(
        &self,
        profile_id: Option<&str>,
        weeks: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<VelocityMetrics>> {
        if weeks > MAX_TREND_WEEKS {
            anyhow::bail!("Trend window of {weeks} weeks exceeds the maximum of {MAX_TREND_WEEKS}");
        }
        let current = week_start_of(now);

        let mut newest_first = Vec::with_capacity(weeks);
        for offset in 0..weeks {
            let Some(week_start) = current.checked_sub_days(Days::new(7 * offset as u64)) else {
                break;
            };
            newest_first.push(self.cached_weekly_velocity(profile_id, week_start)?);
        }
        newest_first.reverse();

        let mut metrics: Vec<VelocityMetrics> = Vec::with_capacity(newest_first.len());
        let mut previous: Option<u64> = None;
        for velocity in newest_first {
            let (trend, change_pct) = match previous {
                Some(prev) => classify_change(prev, velocity.commits, self.trend_threshold_pct),
                None => (Trend::Stable, 0.0),
            };
            previous = Some(velocity.commits);
            metrics.push(VelocityMetrics {
                velocity,
                trend,
                change_pct,
            });
        }

        Ok(metrics)
    }
}

/// Classifies the change from `previous` to `current` commits.
pub fn classify_change(previous: u64, current: u64, threshold_pct: f64) -> (Trend, f64) {
    let change_pct = if previous == 0 {
        if current > 0 {
            100.0
        } else {
            0.0
        }
    } else {
        (current as f64 - previous as f64) / previous as f64 * 100.0
    };

    let trend = if change_pct > threshold_pct {
        Trend::Up
    } else if change_pct < -threshold_pct {
        Trend::Down
    } else {
        Trend::Stable
    };

    (trend, change_pct)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::classify::Category;
    use crate::config::Profile;
    use crate::data::CommitRecord;
    use crate::identity::ConfiguredIdentities;
    use crate::store::{CommitStore, MemoryStore};

    fn add_commit(store: &MemoryStore, hash: &str, email: &str, at: DateTime<Utc>, category: Category) {
        store
            .upsert_commit(CommitRecord {
                hash: hash.to_string(),
                repo_id: "acme/api".to_string(),
                author_email: email.to_string(),
                author_name: "Dev".to_string(),
                timestamp: at,
                message: "msg".to_string(),
                is_merge: false,
                additions: 10,
                deletions: 4,
                files_changed: 2,
                files: None,
                category,
            })
            .unwrap();
    }

    fn identities() -> ConfiguredIdentities {
        ConfiguredIdentities::from_profiles(&[
            Profile {
                id: "alice".to_string(),
                display_name: None,
                emails: vec!["alice@example.com".to_string()],
                login: None,
                avatar_url: None,
            },
            Profile {
                id: "nobody".to_string(),
                display_name: None,
                emails: vec![],
                login: None,
                avatar_url: None,
            },
        ])
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap()
    }

    fn monday(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    // 2026-03-02, 03-09, 03-16 are Mondays

    #[test]
    fn weekly_velocity_sums_window() {
        let store = MemoryStore::new();
        add_commit(&store, "a", "alice@example.com", at(2), Category::Feature);
        add_commit(&store, "b", "bob@example.com", at(8), Category::Bugfix);
        add_commit(&store, "c", "alice@example.com", at(9), Category::Docs);
        let ids = identities();
        let engine = VelocityEngine::new(&store, &store, &ids);

        let team = engine.calculate_weekly_velocity(None, monday(2)).unwrap();
        assert_eq!(team.commits, 2);
        assert_eq!(team.additions, 20);
        assert_eq!(team.deletions, 8);
        assert_eq!(team.files_changed, 4);
        assert_eq!(team.breakdown.feature, 1);
        assert_eq!(team.breakdown.bugfix, 1);
        assert_eq!(team.breakdown.total, 2);

        let alice = engine.calculate_weekly_velocity(Some("alice"), monday(2)).unwrap();
        assert_eq!(alice.commits, 1);
    }

    #[test]
    fn profile_without_emails_is_empty_not_everyone() {
        let store = MemoryStore::new();
        add_commit(&store, "a", "alice@example.com", at(2), Category::Feature);
        let ids = identities();
        let engine = VelocityEngine::new(&store, &store, &ids);

        assert_eq!(
            engine.calculate_weekly_velocity(Some("nobody"), monday(2)).unwrap(),
            WeeklyVelocity::empty(monday(2))
        );
        assert_eq!(
            engine.calculate_weekly_velocity(Some("unknown"), monday(2)).unwrap().commits,
            0
        );
    }

    #[test]
    fn trend_is_chronological_with_directions() {
        let store = MemoryStore::new();
        // week of 03-02: 2 commits, 03-09: 4 commits, 03-16: 4 commits
        add_commit(&store, "a1", "a@x.io", at(2), Category::Feature);
        add_commit(&store, "a2", "a@x.io", at(3), Category::Feature);
        for (i, day) in [9, 10, 11, 12].into_iter().enumerate() {
            add_commit(&store, &format!("b{i}"), "a@x.io", at(day), Category::Chore);
        }
        for (i, day) in [16, 17, 18, 19].into_iter().enumerate() {
            add_commit(&store, &format!("c{i}"), "a@x.io", at(day), Category::Test);
        }
        let ids = identities();
        let engine = VelocityEngine::new(&store, &store, &ids);

        let now = Utc.with_ymd_and_hms(2026, 3, 20, 8, 0, 0).unwrap();
        let trend = engine.velocity_trend_at(None, 3, now).unwrap();

        let weeks: Vec<NaiveDate> = trend.iter().map(|m| m.velocity.week_start).collect();
        assert_eq!(weeks, vec![monday(2), monday(9), monday(16)]);
        assert_eq!(trend[0].trend, Trend::Stable);
        assert_eq!(trend[1].trend, Trend::Up);
        assert_eq!(trend[1].change_pct, 100.0);
        assert_eq!(trend[2].trend, Trend::Stable);
    }

    #[test]
    fn trend_is_idempotent_and_fills_cache_once() {
        let store = MemoryStore::new();
        add_commit(&store, "a1", "a@x.io", at(2), Category::Feature);
        let ids = identities();
        let engine = VelocityEngine::new(&store, &store, &ids);
        let now = Utc.with_ymd_and_hms(2026, 3, 20, 8, 0, 0).unwrap();

        let first = engine.velocity_trend_at(None, 4, now).unwrap();
        assert_eq!(store.snapshot_count(), 4);
        let second = engine.velocity_trend_at(None, 4, now).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.snapshot_count(), 4);
    }

    #[test]
    fn snapshots_stay_frozen_until_invalidated() {
        let store = MemoryStore::new();
        add_commit(&store, "a1", "a@x.io", at(2), Category::Feature);
        let ids = identities();
        let engine = VelocityEngine::new(&store, &store, &ids);

        assert_eq!(engine.cached_weekly_velocity(None, monday(2)).unwrap().commits, 1);
        add_commit(&store, "a2", "a@x.io", at(3), Category::Feature);
        assert_eq!(engine.cached_weekly_velocity(None, monday(2)).unwrap().commits, 1);

        store.invalidate_week(monday(2)).unwrap();
        assert_eq!(engine.cached_weekly_velocity(None, monday(2)).unwrap().commits, 2);
    }

    #[test]
    fn team_and_profile_snapshots_are_separate() {
        let store = MemoryStore::new();
        add_commit(&store, "a1", "alice@example.com", at(2), Category::Feature);
        add_commit(&store, "b1", "bob@example.com", at(2), Category::Feature);
        let ids = identities();
        let engine = VelocityEngine::new(&store, &store, &ids);

        assert_eq!(engine.cached_weekly_velocity(None, monday(2)).unwrap().commits, 2);
        assert_eq!(
            engine.cached_weekly_velocity(Some("alice"), monday(2)).unwrap().commits,
            1
        );
        assert_eq!(store.snapshot_count(), 2);
    }

    #[test]
    fn oversized_trend_window_is_rejected_without_side_effects() {
        let store = MemoryStore::new();
        let ids = identities();
        let engine = VelocityEngine::new(&store, &store, &ids);

        assert!(engine.velocity_trend_at(None, usize::MAX, at(11)).is_err());
        assert!(engine
            .velocity_trend_at(None, MAX_TREND_WEEKS + 1, at(11))
            .is_err());
        assert_eq!(store.snapshot_count(), 0);

        let longest = engine.velocity_trend_at(None, MAX_TREND_WEEKS, at(11)).unwrap();
        assert_eq!(longest.len(), MAX_TREND_WEEKS);
    }

    #[test]
    fn classify_change_thresholds() {
        assert_eq!(classify_change(100, 105, 5.0).0, Trend::Stable);
        assert_eq!(classify_change(100, 106, 5.0).0, Trend::Up);
        assert_eq!(classify_change(100, 94, 5.0).0, Trend::Down);
        assert_eq!(classify_change(0, 0, 5.0), (Trend::Stable, 0.0));
        assert_eq!(classify_change(0, 3, 5.0), (Trend::Up, 100.0));
    }
}
