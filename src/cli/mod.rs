//! CLI interface for devpulse

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod classify;
pub mod report;
pub mod sync;
pub mod workspace;

/// devpulse: commit and review analytics for engineering teams
#[derive(Parser)]
#[command(name = "devpulse")]
#[command(about = "Commit and review analytics for engineering teams", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand)]
pub enum Commands {
    /// Classifies a single commit message.
    Classify(classify::ClassifyCommand),
    /// Collects commits from a git repository into the store.
    Sync(sync::SyncCommand),
    /// Re-runs the classifier over stored commits.
    Recategorize(sync::RecategorizeCommand),
    /// Imports pull requests and reviews from a code-host export.
    #[command(name = "import-reviews")]
    ImportReviews(sync::ImportReviewsCommand),
    /// Counts commits per category over a period.
    Breakdown(report::BreakdownCommand),
    /// Shows weekly velocity with trends.
    Velocity(report::VelocityCommand),
    /// Compares authors' commit volume for the current week.
    Benchmark(report::BenchmarkCommand),
    /// Builds the reviewer to author collaboration graph.
    Collab(report::CollabCommand),
    /// Summarizes review health.
    #[command(name = "review-metrics")]
    ReviewMetrics(report::ReviewMetricsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Classify(cmd) => cmd.execute(),
            Commands::Sync(cmd) => cmd.execute(),
            Commands::Recategorize(cmd) => cmd.execute(),
            Commands::ImportReviews(cmd) => cmd.execute(),
            Commands::Breakdown(cmd) => cmd.execute(),
            Commands::Velocity(cmd) => cmd.execute(),
            Commands::Benchmark(cmd) => cmd.execute(),
            Commands::Collab(cmd) => cmd.execute(),
            Commands::ReviewMetrics(cmd) => cmd.execute(),
        }
    }
}
