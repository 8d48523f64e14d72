//! Store seams for the relational store and identity directory.
//!
//! Analytics only talk to these traits. [`MemoryStore`] is the in-process
//! implementation used by the CLI and the tests.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::classify::Category;
use crate::data::{CommitRecord, PullRequestRecord, ReviewRecord, WeeklyVelocitySnapshot};
use crate::error::StoreError;

pub mod memory;

pub use memory::MemoryStore;

/// Which authors a commit query covers.
#[derive(Debug, Clone, Copy)]
pub enum AuthorFilter<'a> {
    /// Every author.
    Any,
    /// Only these lower-cased emails. An empty set matches nothing.
    Emails(&'a BTreeSet<String>),
}

impl AuthorFilter<'_> {
    /// Returns true when `email` passes the filter.
    pub fn matches(&self, email: &str) -> bool {
        match self {
            AuthorFilter::Any => true,
            AuthorFilter::Emails(emails) => emails.contains(&email.to_lowercase()),
        }
    }
}

/// Result of an insert-or-replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert<T> {
    /// No row existed.
    Inserted,
    /// A different row was replaced; carries the previous row.
    Replaced(T),
    /// An identical row already existed.
    Unchanged,
}

/// Commit rows keyed by `(hash, repo_id)`.
pub trait CommitStore {
    /// Inserts or replaces a commit.
    fn upsert_commit(&self, record: CommitRecord) -> Result<Upsert<CommitRecord>, StoreError>;

    /// Returns commits with `from <= timestamp < to` whose author passes `authors`.
    fn commits_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        authors: AuthorFilter<'_>,
    ) -> Result<Vec<CommitRecord>, StoreError>;

    /// Returns every commit, optionally restricted to one repository.
    fn commits(&self, repo_id: Option<&str>) -> Result<Vec<CommitRecord>, StoreError>;

    /// Rewrites the category of one commit. Returns false when it does not exist.
    fn set_category(&self, repo_id: &str, hash: &str, category: Category)
        -> Result<bool, StoreError>;
}

/// Write-once weekly velocity cache keyed by `(profile_id, week_start)`.
pub trait SnapshotStore {
    /// Looks up a cached snapshot.
    fn snapshot(
        &self,
        profile_id: Option<&str>,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyVelocitySnapshot>, StoreError>;

    /// Inserts or replaces a snapshot.
    fn put_snapshot(&self, snapshot: WeeklyVelocitySnapshot) -> Result<(), StoreError>;

    /// Drops every snapshot (team and profiles) for a week. Returns how many were removed.
    fn invalidate_week(&self, week_start: NaiveDate) -> Result<usize, StoreError>;
}

/// Pull request and review rows.
pub trait ReviewStore {
    /// Inserts or replaces a pull request keyed by `(repo_id, number)`.
    fn upsert_pull_request(&self, pr: PullRequestRecord) -> Result<(), StoreError>;

    /// Inserts or replaces a review keyed by `(repo_id, pr_number, id)`.
    fn upsert_review(&self, review: ReviewRecord) -> Result<(), StoreError>;

    /// Returns pull requests with `from <= created_at < to`.
    fn pull_requests_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        repo_id: Option<&str>,
    ) -> Result<Vec<PullRequestRecord>, StoreError>;

    /// Looks up one pull request.
    fn pull_request(
        &self,
        repo_id: &str,
        number: u64,
    ) -> Result<Option<PullRequestRecord>, StoreError>;

    /// Returns reviews with `from <= submitted_at < to`.
    fn reviews_submitted_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        repo_id: Option<&str>,
    ) -> Result<Vec<ReviewRecord>, StoreError>;

    /// Returns every review of one pull request, oldest first.
    fn reviews_for(&self, repo_id: &str, pr_number: u64) -> Result<Vec<ReviewRecord>, StoreError>;
}

/// Maps raw author emails and code-host logins to people.
pub trait IdentityResolver {
    /// Emails that belong to a profile. Unknown profiles have none.
    fn emails_for_profile(&self, profile_id: &str) -> Vec<String>;

    /// Code-host login recorded for an email.
    fn login_for_email(&self, email: &str) -> Option<String>;

    /// Display name recorded for a login.
    fn display_name(&self, login: &str) -> Option<String>;

    /// Avatar URL recorded for a login.
    fn avatar_url(&self, _login: &str) -> Option<String> {
        None
    }
}
