//! In-process store with optional JSON persistence.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AuthorFilter, CommitStore, ReviewStore, SnapshotStore, Upsert};
use crate::classify::Category;
use crate::data::{CommitRecord, PullRequestRecord, ReviewRecord, WeeklyVelocitySnapshot};
use crate::error::StoreError;

type CommitKey = (String, String);
type SnapshotKey = (Option<String>, NaiveDate);
type PullRequestKey = (String, u64);
type ReviewKey = (String, u64, u64);

#[derive(Debug, Default)]
struct Tables {
    commits: BTreeMap<CommitKey, CommitRecord>,
    snapshots: BTreeMap<SnapshotKey, WeeklyVelocitySnapshot>,
    pull_requests: BTreeMap<PullRequestKey, PullRequestRecord>,
    reviews: BTreeMap<ReviewKey, ReviewRecord>,
}

/// On-disk layout of a saved store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    commits: Vec<CommitRecord>,
    #[serde(default)]
    snapshots: Vec<WeeklyVelocitySnapshot>,
    #[serde(default)]
    pull_requests: Vec<PullRequestRecord>,
    #[serde(default)]
    reviews: Vec<ReviewRecord>,
}

impl From<StoreFile> for Tables {
    fn from(file: StoreFile) -> Self {
        let mut tables = Tables::default();
        for commit in file.commits {
            tables
                .commits
                .insert((commit.repo_id.clone(), commit.hash.clone()), commit);
        }
        for snapshot in file.snapshots {
            tables.snapshots.insert(
                (snapshot.profile_id.clone(), snapshot.velocity.week_start),
                snapshot,
            );
        }
        for pr in file.pull_requests {
            tables
                .pull_requests
                .insert((pr.repo_id.clone(), pr.number), pr);
        }
        for review in file.reviews {
            tables.reviews.insert(
                (review.repo_id.clone(), review.pr_number, review.id),
                review,
            );
        }
        tables
    }
}

/// Store backed by ordered in-memory tables.
///
/// Single-threaded: interior mutability lets every trait method take `&self`,
/// the way a database connection handle would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    path: Option<PathBuf>,
    tables: RefCell<Tables>,
}

impl MemoryStore {
    /// Creates an empty, unpersisted store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store file, starting empty when it does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let tables = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let file: StoreFile =
                serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?;
            Tables::from(file)
        } else {
            debug!(path = %path.display(), "Store file missing, starting empty");
            Tables::default()
        };

        Ok(Self {
            path: Some(path),
            tables: RefCell::new(tables),
        })
    }

    /// Writes the store to its file. A no-op for unpersisted stores.
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = {
            let tables = self.tables.borrow();
            StoreFile {
                commits: tables.commits.values().cloned().collect(),
                snapshots: tables.snapshots.values().cloned().collect(),
                pull_requests: tables.pull_requests.values().cloned().collect(),
                reviews: tables.reviews.values().cloned().collect(),
            }
        };
        let content = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "Store saved");
        Ok(())
    }

    /// Number of cached snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.tables.borrow().snapshots.len()
    }
}

impl CommitStore for MemoryStore {
    fn upsert_commit(&self, record: CommitRecord) -> Result<Upsert<CommitRecord>, StoreError> {
        let key = (record.repo_id.clone(), record.hash.clone());
        let mut tables = self.tables.borrow_mut();
        if tables.commits.get(&key) == Some(&record) {
            return Ok(Upsert::Unchanged);
        }
        match tables.commits.insert(key, record) {
            None => Ok(Upsert::Inserted),
            Some(previous) => Ok(Upsert::Replaced(previous)),
        }
    }

    fn commits_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        authors: AuthorFilter<'_>,
    ) -> Result<Vec<CommitRecord>, StoreError> {
        let tables = self.tables.borrow();
        let mut rows: Vec<CommitRecord> = tables
            .commits
            .values()
            .filter(|c| c.timestamp >= from && c.timestamp < to)
            .filter(|c| authors.matches(&c.author_email))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.hash.cmp(&b.hash)));
        Ok(rows)
    }

    fn commits(&self, repo_id: Option<&str>) -> Result<Vec<CommitRecord>, StoreError> {
        let tables = self.tables.borrow();
        Ok(tables
            .commits
            .values()
            .filter(|c| repo_id.map_or(true, |r| c.repo_id == r))
            .cloned()
            .collect())
    }

    fn set_category(
        &self,
        repo_id: &str,
        hash: &str,
        category: Category,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.borrow_mut();
        match tables
            .commits
            .get_mut(&(repo_id.to_string(), hash.to_string()))
        {
            Some(commit) => {
                commit.category = category;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn snapshot(
        &self,
        profile_id: Option<&str>,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyVelocitySnapshot>, StoreError> {
        let tables = self.tables.borrow();
        Ok(tables
            .snapshots
            .get(&(profile_id.map(str::to_string), week_start))
            .cloned())
    }

    fn put_snapshot(&self, snapshot: WeeklyVelocitySnapshot) -> Result<(), StoreError> {
        let key = (snapshot.profile_id.clone(), snapshot.velocity.week_start);
        self.tables.borrow_mut().snapshots.insert(key, snapshot);
        Ok(())
    }

    fn invalidate_week(&self, week_start: NaiveDate) -> Result<usize, StoreError> {
        let mut tables = self.tables.borrow_mut();
        let before = tables.snapshots.len();
        tables
            .snapshots
            .retain(|(_, week), _| *week != week_start);
        Ok(before - tables.snapshots.len())
    }
}

impl ReviewStore for MemoryStore {
    fn upsert_pull_request(&self, pr: PullRequestRecord) -> Result<(), StoreError> {
        let key = (pr.repo_id.clone(), pr.number);
        self.tables.borrow_mut().pull_requests.insert(key, pr);
        Ok(())
    }

    fn upsert_review(&self, review: ReviewRecord) -> Result<(), StoreError> {
        let key = (review.repo_id.clone(), review.pr_number, review.id);
        self.tables.borrow_mut().reviews.insert(key, review);
        Ok(())
    }

    fn pull_requests_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        repo_id: Option<&str>,
    ) -> Result<Vec<PullRequestRecord>, StoreError> {
        let tables = self.tables.borrow();
        Ok(tables
            .pull_requests
            .values()
            .filter(|pr| pr.created_at >= from && pr.created_at < to)
            .filter(|pr| repo_id.map_or(true, |r| pr.repo_id == r))
            .cloned()
            .collect())
    }

    fn pull_request(
        &self,
        repo_id: &str,
        number: u64,
    ) -> Result<Option<PullRequestRecord>, StoreError> {
        let tables = self.tables.borrow();
        Ok(tables
            .pull_requests
            .get(&(repo_id.to_string(), number))
            .cloned())
    }

    fn reviews_submitted_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        repo_id: Option<&str>,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let tables = self.tables.borrow();
        let mut rows: Vec<ReviewRecord> = tables
            .reviews
            .values()
            .filter(|r| r.submitted_at >= from && r.submitted_at < to)
            .filter(|r| repo_id.map_or(true, |id| r.repo_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    fn reviews_for(&self, repo_id: &str, pr_number: u64) -> Result<Vec<ReviewRecord>, StoreError> {
        let tables = self.tables.borrow();
        let mut rows: Vec<ReviewRecord> = tables
            .reviews
            .range((repo_id.to_string(), pr_number, 0)..=(repo_id.to_string(), pr_number, u64::MAX))
            .map(|(_, review)| review.clone())
            .collect();
        rows.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    use crate::analytics::CategoryBreakdown;
    use crate::data::WeeklyVelocity;

    fn commit(hash: &str, email: &str, day: u32) -> CommitRecord {
        CommitRecord {
            hash: hash.to_string(),
            repo_id: "acme/api".to_string(),
            author_email: email.to_string(),
            author_name: "Dev".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            message: "feat: thing".to_string(),
            is_merge: false,
            additions: 10,
            deletions: 2,
            files_changed: 1,
            files: None,
            category: Category::Feature,
        }
    }

    fn snapshot(profile: Option<&str>, week_start: NaiveDate) -> WeeklyVelocitySnapshot {
        WeeklyVelocitySnapshot {
            profile_id: profile.map(str::to_string),
            velocity: WeeklyVelocity {
                week_start,
                commits: 1,
                additions: 1,
                deletions: 0,
                files_changed: 1,
                breakdown: CategoryBreakdown::default(),
            },
        }
    }

    #[test]
    fn upsert_reports_insert_replace_and_unchanged() {
        let store = MemoryStore::new();
        assert_eq!(store.upsert_commit(commit("a1", "x@y.z", 2)).unwrap(), Upsert::Inserted);
        assert_eq!(store.upsert_commit(commit("a1", "x@y.z", 2)).unwrap(), Upsert::Unchanged);

        let mut changed = commit("a1", "x@y.z", 2);
        changed.additions = 99;
        match store.upsert_commit(changed).unwrap() {
            Upsert::Replaced(previous) => assert_eq!(previous.additions, 10),
            other => panic!("expected replace, got {other:?}"),
        }
        assert_eq!(store.commits(None).unwrap().len(), 1);
    }

    #[test]
    fn commits_between_is_half_open_and_filters_authors() {
        let store = MemoryStore::new();
        store.upsert_commit(commit("a1", "Alice@Example.com", 2)).unwrap();
        store.upsert_commit(commit("b1", "bob@example.com", 3)).unwrap();
        store.upsert_commit(commit("c1", "alice@example.com", 9)).unwrap();

        let from = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let emails: BTreeSet<String> = ["alice@example.com".to_string()].into();

        let rows = store
            .commits_between(from, to, AuthorFilter::Emails(&emails))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hash, "a1");

        let everyone = store.commits_between(from, to, AuthorFilter::Any).unwrap();
        assert_eq!(everyone.len(), 2);
    }

    #[test]
    fn empty_email_set_matches_nothing() {
        let store = MemoryStore::new();
        store.upsert_commit(commit("a1", "alice@example.com", 2)).unwrap();
        let none = BTreeSet::new();
        let from = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
        assert!(store
            .commits_between(from, to, AuthorFilter::Emails(&none))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn set_category_only_touches_category() {
        let store = MemoryStore::new();
        store.upsert_commit(commit("a1", "x@y.z", 2)).unwrap();
        assert!(store.set_category("acme/api", "a1", Category::Docs).unwrap());
        assert!(!store.set_category("acme/api", "missing", Category::Docs).unwrap());

        let row = &store.commits(Some("acme/api")).unwrap()[0];
        assert_eq!(row.category, Category::Docs);
        assert_eq!(row.additions, 10);
    }

    #[test]
    fn invalidate_week_drops_team_and_profile_snapshots() {
        let store = MemoryStore::new();
        let week = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let other_week = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        store.put_snapshot(snapshot(None, week)).unwrap();
        store.put_snapshot(snapshot(Some("alice"), week)).unwrap();
        store.put_snapshot(snapshot(None, other_week)).unwrap();

        assert_eq!(store.invalidate_week(week).unwrap(), 2);
        assert!(store.snapshot(None, week).unwrap().is_none());
        assert!(store.snapshot(None, other_week).unwrap().is_some());
    }

    #[test]
    fn save_and_reopen_round_trips_tables() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.json");

        let store = MemoryStore::open(&path).unwrap();
        store.upsert_commit(commit("a1", "x@y.z", 2)).unwrap();
        store
            .put_snapshot(snapshot(Some("alice"), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()))
            .unwrap();
        store.save().unwrap();

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.commits(None).unwrap().len(), 1);
        assert_eq!(reopened.snapshot_count(), 1);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            MemoryStore::open(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
