//! Commands that write into the store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::Parser;

use crate::data::ReviewDataset;
use crate::git::GitRepository;
use crate::sync::{import_reviews, ingest_commits, recategorize};

use super::workspace::StoreArgs;

/// Sync command options.
#[derive(Parser)]
pub struct SyncCommand {
    /// Path to the git repository.
    #[arg(value_name = "REPO_PATH", default_value = ".")]
    pub path: PathBuf,

    /// Repository id for stored rows (defaults to owner/name of origin).
    #[arg(long)]
    pub repo_id: Option<String>,

    /// Only sync commits authored on or after this day.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub since: Option<NaiveDate>,

    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

impl SyncCommand {
    /// Executes the sync command.
    pub fn execute(self) -> Result<()> {
        let repo = GitRepository::open_at(&self.path).with_context(|| {
            format!("Failed to open git repository at {}", self.path.display())
        })?;
        let repo_id = self.repo_id.unwrap_or_else(|| repo.default_repo_id());
        let since = self.since.map(|day| day.and_time(NaiveTime::MIN).and_utc());

        let rows = repo.collect_commits(&repo_id, since)?;
        let workspace = self.store.open()?;
        let summary = ingest_commits(&workspace.store, rows)?;
        workspace.save()?;

        workspace.print(&summary)
    }
}

/// Recategorize command options.
#[derive(Parser)]
pub struct RecategorizeCommand {
    /// Only recategorize commits of this repository.
    #[arg(long)]
    pub repo: Option<String>,

    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

impl RecategorizeCommand {
    /// Executes the recategorize command.
    pub fn execute(self) -> Result<()> {
        let workspace = self.store.open()?;
        let summary = recategorize(&workspace.store, self.repo.as_deref())?;
        if summary.changed > 0 {
            workspace.save()?;
        }

        workspace.print(&summary)
    }
}

/// Import-reviews command options.
#[derive(Parser)]
pub struct ImportReviewsCommand {
    /// YAML or JSON export with `pullRequests` and `reviews`.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

impl ImportReviewsCommand {
    /// Executes the import-reviews command.
    pub fn execute(self) -> Result<()> {
        let dataset = ReviewDataset::load_from_file(&self.file)?;
        let workspace = self.store.open()?;
        let summary = import_reviews(&workspace.store, dataset)?;
        workspace.save()?;

        workspace.print(&summary)
    }
}
