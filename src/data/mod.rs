//! Row types exchanged with the stores and the code-host export.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::CategoryBreakdown;
use crate::classify::Category;

pub mod dataset;
pub mod yaml;

pub use dataset::ReviewDataset;
pub use yaml::{from_yaml, to_yaml};

/// One commit of one repository, unique by `(hash, repo_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash.
    pub hash: String,
    /// Repository the commit was synced from.
    pub repo_id: String,
    /// Author email address as recorded by git.
    pub author_email: String,
    /// Author name as recorded by git.
    pub author_name: String,
    /// Author timestamp.
    pub timestamp: DateTime<Utc>,
    /// Full commit message.
    pub message: String,
    /// Whether the commit has more than one parent.
    #[serde(default)]
    pub is_merge: bool,
    /// Lines added.
    #[serde(default)]
    pub additions: u64,
    /// Lines deleted.
    #[serde(default)]
    pub deletions: u64,
    /// Number of files touched.
    #[serde(default)]
    pub files_changed: u64,
    /// Changed paths, when the source supplied them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    /// Assigned work-type category.
    #[serde(default)]
    pub category: Category,
}

/// Pull request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    /// Open and not merged.
    Open,
    /// Closed without merging.
    Closed,
    /// Merged.
    Merged,
}

/// Pull request row from the code host, unique by `(repo_id, number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRecord {
    /// Repository identifier.
    pub repo_id: String,
    /// Pull request number within the repository.
    pub number: u64,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Code-host login of the author.
    pub author_login: String,
    /// Lifecycle state.
    pub state: PrState,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Merge time, if merged.
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    /// Close time, if closed or merged.
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Logins whose review is requested.
    #[serde(default)]
    pub requested_reviewers: Vec<String>,
}

/// Review verdict as reported by the code host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    /// Approved.
    Approved,
    /// Changes requested.
    ChangesRequested,
    /// Comment-only review.
    Commented,
    /// Dismissed review.
    Dismissed,
    /// Draft review not yet submitted.
    Pending,
}

/// Review row, unique by `(repo_id, pr_number, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    /// Code-host review identifier.
    pub id: u64,
    /// Repository identifier.
    pub repo_id: String,
    /// Reviewed pull request number.
    pub pr_number: u64,
    /// Code-host login of the reviewer.
    pub reviewer_login: String,
    /// Verdict.
    pub state: ReviewState,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
}

/// Weekly aggregate over a set of authors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyVelocity {
    /// Monday that opens the week.
    pub week_start: NaiveDate,
    /// Number of commits.
    pub commits: u64,
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
    /// Files touched, summed over commits.
    pub files_changed: u64,
    /// Per-category commit counts.
    pub breakdown: CategoryBreakdown,
}

impl WeeklyVelocity {
    /// Returns an all-zero week.
    pub fn empty(week_start: NaiveDate) -> Self {
        Self {
            week_start,
            commits: 0,
            additions: 0,
            deletions: 0,
            files_changed: 0,
            breakdown: CategoryBreakdown::default(),
        }
    }
}

/// Cached weekly aggregate, unique by `(profile_id, week_start)`.
///
/// `profile_id = None` is the whole-team aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyVelocitySnapshot {
    /// Profile the snapshot belongs to, or `None` for the team.
    pub profile_id: Option<String>,
    /// Aggregated values.
    #[serde(flatten)]
    pub velocity: WeeklyVelocity,
}
