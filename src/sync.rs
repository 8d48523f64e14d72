//! Writes raw rows into the store: classified commits and imported reviews.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analytics::stats::week_start_of;
use crate::analytics::CategoryBreakdown;
use crate::classify::categorize_commit;
use crate::data::{CommitRecord, ReviewDataset};
use crate::store::{CommitStore, ReviewStore, SnapshotStore, Upsert};

/// Outcome of [`ingest_commits`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Rows that did not exist before.
    pub inserted: usize,
    /// Rows that replaced a different stored row.
    pub updated: usize,
    /// Rows identical to what was stored.
    pub unchanged: usize,
    /// Velocity snapshots dropped because their week changed.
    pub invalidated_snapshots: usize,
    /// Categories of every ingested row.
    pub breakdown: CategoryBreakdown,
}

/// Outcome of [`recategorize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecategorizeSummary {
    /// Rows examined.
    pub scanned: usize,
    /// Rows whose category changed.
    pub changed: usize,
    /// Velocity snapshots dropped because their week changed.
    pub invalidated_snapshots: usize,
}

/// Outcome of [`import_reviews`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Pull requests written.
    pub pull_requests: usize,
    /// Reviews written.
    pub reviews: usize,
}

/// Classifies and upserts commit rows, dropping snapshots of affected weeks.
pub fn ingest_commits<S>(store: &S, rows: Vec<CommitRecord>) -> Result<IngestSummary>
where
    S: CommitStore + SnapshotStore,
{
    let mut summary = IngestSummary::default();
    let mut touched: BTreeSet<NaiveDate> = BTreeSet::new();

    for mut row in rows {
        let result = categorize_commit(&row.message, row.files.as_deref(), row.is_merge);
        row.category = result.category;
        summary.breakdown.record(row.category);

        let week = week_start_of(row.timestamp);
        let hash = row.hash.clone();
        match store
            .upsert_commit(row)
            .with_context(|| format!("Failed to store commit {hash}"))?
        {
            Upsert::Inserted => {
                summary.inserted += 1;
                touched.insert(week);
            }
            Upsert::Replaced(previous) => {
                summary.updated += 1;
                touched.insert(week);
                touched.insert(week_start_of(previous.timestamp));
            }
            Upsert::Unchanged => summary.unchanged += 1,
        }
    }

    summary.invalidated_snapshots = invalidate_weeks(store, &touched)?;

    info!(
        inserted = summary.inserted,
        updated = summary.updated,
        unchanged = summary.unchanged,
        invalidated = summary.invalidated_snapshots,
        "Ingested commits"
    );
    Ok(summary)
}

/// Re-runs the classifier over stored commits and rewrites changed categories.
pub fn recategorize<S>(store: &S, repo_id: Option<&str>) -> Result<RecategorizeSummary>
where
    S: CommitStore + SnapshotStore,
{
    let rows = store
        .commits(repo_id)
        .context("Failed to load commits for recategorization")?;
    let mut summary = RecategorizeSummary {
        scanned: rows.len(),
        ..RecategorizeSummary::default()
    };
    let mut touched: BTreeSet<NaiveDate> = BTreeSet::new();

    for row in &rows {
        let result = categorize_commit(&row.message, row.files.as_deref(), row.is_merge);
        if result.category == row.category {
            continue;
        }
        debug!(
            hash = %row.hash,
            from = %row.category,
            to = %result.category,
            "Category changed"
        );
        if store
            .set_category(&row.repo_id, &row.hash, result.category)
            .with_context(|| format!("Failed to update commit {}", row.hash))?
        {
            summary.changed += 1;
            touched.insert(week_start_of(row.timestamp));
        }
    }

    summary.invalidated_snapshots = invalidate_weeks(store, &touched)?;

    info!(
        scanned = summary.scanned,
        changed = summary.changed,
        "Recategorized commits"
    );
    Ok(summary)
}

/// Upserts every pull request and review of a validated dataset.
pub fn import_reviews<S: ReviewStore>(store: &S, dataset: ReviewDataset) -> Result<ImportSummary> {
    dataset.validate()?;

    let summary = ImportSummary {
        pull_requests: dataset.pull_requests.len(),
        reviews: dataset.reviews.len(),
    };

    for pr in dataset.pull_requests {
        let label = format!("{}#{}", pr.repo_id, pr.number);
        store
            .upsert_pull_request(pr)
            .with_context(|| format!("Failed to store pull request {label}"))?;
    }
    for review in dataset.reviews {
        let id = review.id;
        store
            .upsert_review(review)
            .with_context(|| format!("Failed to store review {id}"))?;
    }

    info!(
        pull_requests = summary.pull_requests,
        reviews = summary.reviews,
        "Imported review data"
    );
    Ok(summary)
}

fn invalidate_weeks<S: SnapshotStore>(store: &S, weeks: &BTreeSet<NaiveDate>) -> Result<usize> {
    let mut dropped = 0;
    for week in weeks {
        dropped += store
            .invalidate_week(*week)
            .with_context(|| format!("Failed to invalidate snapshots for {week}"))?;
    }
    Ok(dropped)
}
