//! Read-side report commands.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;

use crate::analytics::{
    calculate_breakdown, team_benchmarks, CategoryBreakdown, CollaborationAnalyzer, VelocityEngine,
};
use crate::store::{AuthorFilter, CommitStore, IdentityResolver};

use super::workspace::{PeriodArgs, StoreArgs};

/// Breakdown command options.
#[derive(Parser)]
pub struct BreakdownCommand {
    /// Only count commits of this profile.
    #[arg(long)]
    pub profile: Option<String>,

    /// Only count commits of this repository.
    #[arg(long)]
    pub repo: Option<String>,

    #[command(flatten)]
    pub(crate) period: PeriodArgs,

    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

#[derive(Serialize)]
struct BreakdownReport {
    profile: Option<String>,
    repo: Option<String>,
    from: chrono::DateTime<Utc>,
    to: chrono::DateTime<Utc>,
    breakdown: CategoryBreakdown,
}

impl BreakdownCommand {
    /// Executes the breakdown command.
    pub fn execute(self) -> Result<()> {
        let workspace = self.store.open()?;
        let (from, to) = self.period.window(Utc::now())?;

        let emails: Option<BTreeSet<String>> = self.profile.as_deref().map(|id| {
            workspace
                .identities
                .emails_for_profile(id)
                .into_iter()
                .collect()
        });
        let filter = match &emails {
            None => AuthorFilter::Any,
            Some(set) => AuthorFilter::Emails(set),
        };

        let categories: Vec<_> = workspace
            .store
            .commits_between(from, to, filter)
            .context("Failed to load commits")?
            .into_iter()
            .filter(|c| self.repo.as_deref().map_or(true, |r| c.repo_id == r))
            .map(|c| c.category)
            .collect();

        workspace.print(&BreakdownReport {
            profile: self.profile,
            repo: self.repo,
            from,
            to,
            breakdown: calculate_breakdown(&categories),
        })
    }
}

/// Velocity command options.
#[derive(Parser)]
pub struct VelocityCommand {
    /// Profile to report on; the whole team when omitted.
    #[arg(long)]
    pub profile: Option<String>,

    /// Number of weeks ending with the current one.
    #[arg(long)]
    pub weeks: Option<usize>,

    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

impl VelocityCommand {
    /// Executes the velocity command.
    pub fn execute(self) -> Result<()> {
        let workspace = self.store.open()?;
        let weeks = self
            .weeks
            .unwrap_or(workspace.settings.velocity.default_weeks);

        let engine = VelocityEngine::new(&workspace.store, &workspace.store, &workspace.identities)
            .with_trend_threshold(workspace.settings.velocity.trend_threshold_pct);
        let trend = engine.velocity_trend(self.profile.as_deref(), weeks)?;
        workspace.save()?;

        workspace.print(&trend)
    }
}

/// Benchmark command options.
#[derive(Parser)]
pub struct BenchmarkCommand {
    /// Email whose rank and percentile to report.
    #[arg(long)]
    pub email: Option<String>,

    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

impl BenchmarkCommand {
    /// Executes the benchmark command.
    pub fn execute(self) -> Result<()> {
        let workspace = self.store.open()?;
        let benchmarks = team_benchmarks(&workspace.store, self.email.as_deref())?;
        workspace.print(&benchmarks)
    }
}

/// Collab command options.
#[derive(Parser)]
pub struct CollabCommand {
    /// Only include this repository.
    #[arg(long)]
    pub repo: Option<String>,

    #[command(flatten)]
    pub(crate) period: PeriodArgs,

    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

impl CollabCommand {
    /// Executes the collab command.
    pub fn execute(self) -> Result<()> {
        let workspace = self.store.open()?;
        let (from, to) = self.period.window(Utc::now())?;

        let mut analyzer = CollaborationAnalyzer::new(&workspace.store, &workspace.identities)
            .with_settings(workspace.settings.reviews.clone());
        if let Some(repo) = self.repo {
            analyzer = analyzer.for_repo(repo);
        }

        let graph = analyzer.build_collaboration_graph(from, to)?;
        workspace.print(&graph)
    }
}

/// Review-metrics command options.
#[derive(Parser)]
pub struct ReviewMetricsCommand {
    /// Only include this repository.
    #[arg(long)]
    pub repo: Option<String>,

    #[command(flatten)]
    pub(crate) period: PeriodArgs,

    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

impl ReviewMetricsCommand {
    /// Executes the review-metrics command.
    pub fn execute(self) -> Result<()> {
        let workspace = self.store.open()?;
        let (from, to) = self.period.window(Utc::now())?;

        let mut analyzer = CollaborationAnalyzer::new(&workspace.store, &workspace.identities)
            .with_settings(workspace.settings.reviews.clone());
        if let Some(repo) = self.repo {
            analyzer = analyzer.for_repo(repo);
        }

        let metrics = analyzer.enhanced_review_metrics(from, to)?;
        workspace.print(&metrics)
    }
}
