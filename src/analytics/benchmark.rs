//! Team benchmarks over the current week's commit volume.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::stats::{mean, median, week_bounds, week_start_of};
use crate::store::{AuthorFilter, CommitStore};

/// Commit volume of one author email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorVolume {
    /// Lower-cased author email.
    pub email: String,
    /// Commits in the week.
    pub commits: u64,
}

/// Where one author stands in the team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// Email the standing was requested for.
    pub email: String,
    /// Commits in the week.
    pub commits: u64,
    /// 1-indexed position in descending order.
    pub rank: usize,
    /// `round((n - rank + 1) / n * 100)`.
    pub percentile: u32,
}

/// Weekly commit volume statistics across authors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamBenchmarks {
    /// Monday of the benchmarked week.
    pub week_start: NaiveDate,
    /// Authors by descending volume.
    pub contributors: Vec<ContributorVolume>,
    /// Mean commits per author.
    pub average: f64,
    /// Median commits per author.
    pub median: f64,
    /// Highest commits of any author.
    pub max: u64,
    /// Standing of the requested email, when it committed this week.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standing: Option<Standing>,
}

/// Benchmarks the current week.
pub fn team_benchmarks<C: CommitStore>(store: &C, email: Option<&str>) -> Result<TeamBenchmarks> {
    team_benchmarks_at(store, email, Utc::now())
}

/// Benchmarks the week containing `now`.
pub fn team_benchmarks_at<C: CommitStore>(
    store: &C,
    email: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TeamBenchmarks> {
    let week_start = week_start_of(now);
    let (from, to) = week_bounds(week_start);
    let rows = store
        .commits_between(from, to, AuthorFilter::Any)
        .context("Failed to load commits for benchmarks")?;

    let mut per_email: BTreeMap<String, u64> = BTreeMap::new();
    for row in rows {
        *per_email.entry(row.author_email.to_lowercase()).or_insert(0) += 1;
    }

    let mut contributors: Vec<ContributorVolume> = per_email
        .into_iter()
        .map(|(email, commits)| ContributorVolume { email, commits })
        .collect();
    // stable sort keeps emails alphabetical within equal counts
    contributors.sort_by(|a, b| b.commits.cmp(&a.commits));

    let counts: Vec<f64> = contributors.iter().map(|c| c.commits as f64).collect();
    let n = contributors.len();

    let standing = email.and_then(|wanted| {
        let wanted = wanted.to_lowercase();
        contributors
            .iter()
            .position(|c| c.email == wanted)
            .map(|index| {
                let rank = index + 1;
                Standing {
                    email: wanted,
                    commits: contributors[index].commits,
                    rank,
                    percentile: (((n - rank + 1) as f64 / n as f64) * 100.0).round() as u32,
                }
            })
    });

    Ok(TeamBenchmarks {
        week_start,
        average: mean(&counts).unwrap_or(0.0),
        median: median(&counts).unwrap_or(0.0),
        max: contributors.first().map_or(0, |c| c.commits),
        contributors,
        standing,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::classify::Category;
    use crate::data::CommitRecord;
    use crate::store::MemoryStore;

    fn seed(store: &MemoryStore, email: &str, count: usize) {
        for i in 0..count {
            store
                .upsert_commit(CommitRecord {
                    hash: format!("{email}-{i}"),
                    repo_id: "acme/api".to_string(),
                    author_email: email.to_string(),
                    author_name: "Dev".to_string(),
                    timestamp: Utc.with_ymd_and_hms(2026, 3, 3, 9, i as u32, 0).unwrap(),
                    message: "msg".to_string(),
                    is_merge: false,
                    additions: 1,
                    deletions: 0,
                    files_changed: 1,
                    files: None,
                    category: Category::Other,
                })
                .unwrap();
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_week_is_all_zero() {
        let store = MemoryStore::new();
        let result = team_benchmarks_at(&store, Some("a@x.io"), now()).unwrap();
        assert!(result.contributors.is_empty());
        assert_eq!(result.average, 0.0);
        assert_eq!(result.median, 0.0);
        assert_eq!(result.max, 0);
        assert!(result.standing.is_none());
    }

    #[test]
    fn even_count_median_averages_middle_values() {
        let store = MemoryStore::new();
        seed(&store, "a@x.io", 2);
        seed(&store, "b@x.io", 4);
        seed(&store, "c@x.io", 6);
        seed(&store, "d@x.io", 8);

        let result = team_benchmarks_at(&store, None, now()).unwrap();
        assert_eq!(result.median, 5.0);
        assert_eq!(result.average, 5.0);
        assert_eq!(result.max, 8);
        assert_eq!(result.contributors[0].email, "d@x.io");
    }

    #[test]
    fn standing_uses_rank_and_percentile() {
        let store = MemoryStore::new();
        seed(&store, "a@x.io", 2);
        seed(&store, "b@x.io", 4);
        seed(&store, "c@x.io", 6);
        seed(&store, "d@x.io", 8);

        let result = team_benchmarks_at(&store, Some("B@X.io"), now()).unwrap();
        let standing = result.standing.unwrap();
        assert_eq!(standing.rank, 3);
        // (4 - 3 + 1) / 4 = 50%
        assert_eq!(standing.percentile, 50);

        let top = team_benchmarks_at(&store, Some("d@x.io"), now())
            .unwrap()
            .standing
            .unwrap();
        assert_eq!(top.rank, 1);
        assert_eq!(top.percentile, 100);
    }

    #[test]
    fn absent_email_has_no_standing() {
        let store = MemoryStore::new();
        seed(&store, "a@x.io", 1);
        let result = team_benchmarks_at(&store, Some("z@x.io"), now()).unwrap();
        assert!(result.standing.is_none());
    }
}
