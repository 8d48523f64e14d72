//! Reviewer/author collaboration graph and review-health metrics.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stats::{coefficient_of_variation, hours_between, mean, median, percent, round1};
use crate::config::ReviewSettings;
use crate::data::{PrState, PullRequestRecord, ReviewRecord, ReviewState};
use crate::store::{AuthorFilter, CommitStore, IdentityResolver, ReviewStore};

/// A person in the collaboration graph, keyed by code-host login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationNode {
    /// Code-host login.
    pub login: String,
    /// Resolved display name, or the login.
    pub display_name: String,
    /// Avatar URL, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Reviews submitted.
    pub reviews_given: u64,
    /// Reviews received on own pull requests.
    pub reviews_received: u64,
    /// Pull requests opened.
    pub prs_opened: u64,
    /// Pull requests merged.
    pub prs_merged: u64,
    /// Commits mapped to this login.
    pub commits: u64,
}

impl CollaborationNode {
    fn new(login: &str) -> Self {
        Self {
            login: login.to_string(),
            display_name: login.to_string(),
            avatar_url: None,
            reviews_given: 0,
            reviews_received: 0,
            prs_opened: 0,
            prs_merged: 0,
            commits: 0,
        }
    }
}

/// Directed reviewer to author edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationEdge {
    /// Reviewer login.
    pub reviewer: String,
    /// Pull request author login.
    pub author: String,
    /// Total reviews from reviewer to author.
    pub weight: u64,
    /// Distinct pull request numbers reviewed, ascending.
    pub pr_numbers: Vec<u64>,
}

/// Nodes ordered by login; edges by descending weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationGraph {
    /// People.
    pub nodes: Vec<CollaborationNode>,
    /// Reviewer to author interactions, never self-loops.
    pub edges: Vec<CollaborationEdge>,
}

/// Review activity of one reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerStats {
    /// Reviewer login.
    pub login: String,
    /// Resolved display name, or the login.
    pub display_name: String,
    /// Reviews submitted on other people's pull requests.
    pub reviews: u64,
    /// Approvals among them.
    pub approvals: u64,
    /// Change requests among them.
    pub changes_requested: u64,
    /// Comment-only reviews among them.
    pub comments: u64,
    /// Distinct pull requests reviewed.
    pub prs_reviewed: u64,
    /// Mean hours from PR creation to this reviewer's first review.
    pub avg_response_hours: Option<f64>,
}

/// A reviewer with outstanding review requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReviewer {
    /// Requested reviewer login.
    pub login: String,
    /// Resolved display name, or the login.
    pub display_name: String,
    /// Open pull requests waiting on this reviewer.
    pub pending: u64,
    /// Their numbers, ascending.
    pub pr_numbers: Vec<u64>,
}

/// Review health over the pull requests created in a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedReviewMetrics {
    /// Pull requests created in the period.
    pub total_prs: usize,
    /// Of which merged.
    pub merged_prs: usize,
    /// Of which still open.
    pub open_prs: usize,
    /// Reviews on those pull requests.
    pub total_reviews: usize,
    /// Mean hours to first review.
    pub avg_hours_to_first_review: Option<f64>,
    /// Median hours to first review.
    pub median_hours_to_first_review: Option<f64>,
    /// Mean hours to merge.
    pub avg_hours_to_merge: Option<f64>,
    /// Median hours to merge.
    pub median_hours_to_merge: Option<f64>,
    /// Percent of reviews that approve.
    pub approval_rate: f64,
    /// Percent of reviews that request changes.
    pub changes_requested_rate: f64,
    /// Mean rounds per reviewed pull request (1 + change requests).
    pub avg_review_rounds: f64,
    /// Percent of merged pull requests that had no review.
    pub self_merge_rate: f64,
    /// Open, unreviewed pull requests older than the stale threshold.
    pub stale_prs: usize,
    /// 0-100 evenness of review load; 100 with fewer than two reviewers.
    pub load_balance: u8,
    /// Busiest reviewers.
    pub reviewers: Vec<ReviewerStats>,
    /// Reviewers with the most outstanding requests.
    pub pending_reviewers: Vec<PendingReviewer>,
}

/// Builds collaboration and review-health reports from review and commit rows.
pub struct CollaborationAnalyzer<'a, S, R> {
    store: &'a S,
    identities: &'a R,
    settings: ReviewSettings,
    repo_id: Option<String>,
}

impl<'a, S, R> CollaborationAnalyzer<'a, S, R>
where
    S: ReviewStore + CommitStore,
    R: IdentityResolver,
{
    /// Creates an analyzer with default review settings over every repository.
    pub fn new(store: &'a S, identities: &'a R) -> Self {
        Self {
            store,
            identities,
            settings: ReviewSettings::default(),
            repo_id: None,
        }
    }

    /// Overrides the review settings.
    pub fn with_settings(mut self, settings: ReviewSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Restricts every report to one repository.
    pub fn for_repo(mut self, repo_id: impl Into<String>) -> Self {
        self.repo_id = Some(repo_id.into());
        self
    }

    fn display_name(&self, login: &str) -> String {
        self.identities
            .display_name(login)
            .unwrap_or_else(|| login.to_string())
    }

    /// Builds the graph from reviews, pull requests and commits in `[from, to)`.
    pub fn build_collaboration_graph(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<CollaborationGraph> {
        let repo = self.repo_id.as_deref();
        let mut nodes: BTreeMap<String, CollaborationNode> = BTreeMap::new();
        let mut edges: BTreeMap<(String, String), (u64, BTreeSet<u64>)> = BTreeMap::new();

        let reviews = self
            .store
            .reviews_submitted_between(from, to, repo)
            .context("Failed to load reviews")?;
        let mut pr_cache: HashMap<(String, u64), Option<PullRequestRecord>> = HashMap::new();

        for review in &reviews {
            let key = (review.repo_id.clone(), review.pr_number);
            let pr = match pr_cache.get(&key) {
                Some(cached) => cached.clone(),
                None => {
                    let found = self
                        .store
                        .pull_request(&review.repo_id, review.pr_number)
                        .context("Failed to load reviewed pull request")?;
                    pr_cache.insert(key, found.clone());
                    found
                }
            };
            let Some(pr) = pr else {
                debug!(repo = %review.repo_id, pr = review.pr_number, "Review without pull request skipped");
                continue;
            };

            node(&mut nodes, &review.reviewer_login).reviews_given += 1;
            node(&mut nodes, &pr.author_login).reviews_received += 1;

            if review.reviewer_login != pr.author_login {
                let edge = edges
                    .entry((review.reviewer_login.clone(), pr.author_login.clone()))
                    .or_default();
                edge.0 += 1;
                edge.1.insert(pr.number);
            }
        }

        let prs = self
            .store
            .pull_requests_created_between(from, to, repo)
            .context("Failed to load pull requests")?;
        for pr in &prs {
            let author = node(&mut nodes, &pr.author_login);
            author.prs_opened += 1;
            if pr.state == PrState::Merged {
                author.prs_merged += 1;
            }
        }

        let commits = self
            .store
            .commits_between(from, to, AuthorFilter::Any)
            .context("Failed to load commits")?;
        for commit in commits
            .iter()
            .filter(|c| repo.map_or(true, |r| c.repo_id == r))
        {
            match self.identities.login_for_email(&commit.author_email) {
                Some(login) => node(&mut nodes, &login).commits += 1,
                None => debug!(email = %commit.author_email, "Commit author has no login"),
            }
        }

        let nodes = nodes
            .into_values()
            .map(|mut n| {
                n.display_name = self.display_name(&n.login);
                n.avatar_url = self.identities.avatar_url(&n.login);
                n
            })
            .collect();

        let mut edges: Vec<CollaborationEdge> = edges
            .into_iter()
            .map(|((reviewer, author), (weight, prs))| CollaborationEdge {
                reviewer,
                author,
                weight,
                pr_numbers: prs.into_iter().collect(),
            })
            .collect();
        edges.sort_by(|a, b| b.weight.cmp(&a.weight));

        Ok(CollaborationGraph { nodes, edges })
    }

    /// Review health for pull requests created in `[from, to)`.
    pub fn enhanced_review_metrics(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<EnhancedReviewMetrics> {
        self.enhanced_review_metrics_at(from, to, Utc::now())
    }

    /// Like [`Self::enhanced_review_metrics`] with an explicit clock for staleness.
    pub fn enhanced_review_metrics_at(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<EnhancedReviewMetrics> {
        let prs = self
            .store
            .pull_requests_created_between(from, to, self.repo_id.as_deref())
            .context("Failed to load pull requests")?;
        let stale_cutoff = TimeDelta::try_days(self.settings.stale_after_days)
            .and_then(|age| now.checked_sub_signed(age))
            .with_context(|| {
                format!(
                    "Stale threshold of {} days is out of range",
                    self.settings.stale_after_days
                )
            })?;

        let mut first_review_hours = Vec::new();
        let mut merge_hours = Vec::new();
        let mut rounds = Vec::new();
        let mut total_reviews = 0usize;
        let mut approvals = 0usize;
        let mut change_requests = 0usize;
        let mut merged = 0usize;
        let mut merged_unreviewed = 0usize;
        let mut open = 0usize;
        let mut stale = 0usize;
        let mut reviewers: BTreeMap<String, ReviewerTally> = BTreeMap::new();
        let mut pending: BTreeMap<String, BTreeSet<u64>> = BTreeMap::new();

        for pr in &prs {
            let reviews = self
                .store
                .reviews_for(&pr.repo_id, pr.number)
                .with_context(|| format!("Failed to load reviews for {}#{}", pr.repo_id, pr.number))?;

            if let Some(first) = reviews.iter().map(|r| r.submitted_at).min() {
                push_non_negative(&mut first_review_hours, hours_between(pr.created_at, first), pr);
            }

            if pr.state == PrState::Merged {
                merged += 1;
                if reviews.is_empty() {
                    merged_unreviewed += 1;
                }
                if let Some(merged_at) = pr.merged_at {
                    push_non_negative(&mut merge_hours, hours_between(pr.created_at, merged_at), pr);
                }
            }

            if pr.state == PrState::Open {
                open += 1;
                if reviews.is_empty() && pr.created_at <= stale_cutoff {
                    stale += 1;
                }
                for requested in &pr.requested_reviewers {
                    if !reviews.iter().any(|r| &r.reviewer_login == requested) {
                        pending
                            .entry(requested.clone())
                            .or_default()
                            .insert(pr.number);
                    }
                }
            }

            if !reviews.is_empty() {
                let changes = count_state(&reviews, ReviewState::ChangesRequested);
                rounds.push(1.0 + changes as f64);
            }

            total_reviews += reviews.len();
            approvals += count_state(&reviews, ReviewState::Approved);
            change_requests += count_state(&reviews, ReviewState::ChangesRequested);

            for review in reviews.iter().filter(|r| r.reviewer_login != pr.author_login) {
                reviewers
                    .entry(review.reviewer_login.clone())
                    .or_default()
                    .record(review, pr);
            }
        }

        let reviewer_counts: Vec<f64> = reviewers.values().map(|t| t.reviews as f64).collect();

        let mut reviewer_stats: Vec<ReviewerStats> = reviewers
            .into_iter()
            .map(|(login, tally)| tally.into_stats(self.display_name(&login), login))
            .collect();
        reviewer_stats.sort_by(|a, b| b.reviews.cmp(&a.reviews));
        reviewer_stats.truncate(self.settings.top_reviewers);

        let mut pending_reviewers: Vec<PendingReviewer> = pending
            .into_iter()
            .map(|(login, numbers)| PendingReviewer {
                display_name: self.display_name(&login),
                login,
                pending: numbers.len() as u64,
                pr_numbers: numbers.into_iter().collect(),
            })
            .collect();
        pending_reviewers.sort_by(|a, b| b.pending.cmp(&a.pending));
        pending_reviewers.truncate(self.settings.top_pending);

        Ok(EnhancedReviewMetrics {
            total_prs: prs.len(),
            merged_prs: merged,
            open_prs: open,
            total_reviews,
            avg_hours_to_first_review: mean(&first_review_hours).map(round1),
            median_hours_to_first_review: median(&first_review_hours).map(round1),
            avg_hours_to_merge: mean(&merge_hours).map(round1),
            median_hours_to_merge: median(&merge_hours).map(round1),
            approval_rate: round1(percent(approvals, total_reviews)),
            changes_requested_rate: round1(percent(change_requests, total_reviews)),
            avg_review_rounds: round1(mean(&rounds).unwrap_or(0.0)),
            self_merge_rate: round1(percent(merged_unreviewed, merged)),
            stale_prs: stale,
            load_balance: load_balance(&reviewer_counts),
            reviewers: reviewer_stats,
            pending_reviewers,
        })
    }
}

/// Scores how evenly reviews are spread: `clamp(0, 100, round(100 - cv * 50))`.
pub fn load_balance(reviewer_counts: &[f64]) -> u8 {
    match coefficient_of_variation(reviewer_counts) {
        Some(cv) => (100.0 - cv * 50.0).round().clamp(0.0, 100.0) as u8,
        None => 100,
    }
}

#[derive(Debug, Default)]
struct ReviewerTally {
    reviews: u64,
    approvals: u64,
    changes_requested: u64,
    comments: u64,
    first_review_by_pr: BTreeMap<(String, u64), (DateTime<Utc>, DateTime<Utc>)>,
}

impl ReviewerTally {
    fn record(&mut self, review: &ReviewRecord, pr: &PullRequestRecord) {
        self.reviews += 1;
        match review.state {
            ReviewState::Approved => self.approvals += 1,
            ReviewState::ChangesRequested => self.changes_requested += 1,
            ReviewState::Commented => self.comments += 1,
            ReviewState::Dismissed | ReviewState::Pending => {}
        }
        let entry = self
            .first_review_by_pr
            .entry((pr.repo_id.clone(), pr.number))
            .or_insert((pr.created_at, review.submitted_at));
        if review.submitted_at < entry.1 {
            entry.1 = review.submitted_at;
        }
    }

    fn into_stats(self, display_name: String, login: String) -> ReviewerStats {
        let response_hours: Vec<f64> = self
            .first_review_by_pr
            .values()
            .map(|(created, first)| hours_between(*created, *first))
            .filter(|h| *h >= 0.0)
            .collect();
        ReviewerStats {
            login,
            display_name,
            reviews: self.reviews,
            approvals: self.approvals,
            changes_requested: self.changes_requested,
            comments: self.comments,
            prs_reviewed: self.first_review_by_pr.len() as u64,
            avg_response_hours: mean(&response_hours).map(round1),
        }
    }
}

fn node<'m>(nodes: &'m mut BTreeMap<String, CollaborationNode>, login: &str) -> &'m mut CollaborationNode {
    nodes
        .entry(login.to_string())
        .or_insert_with(|| CollaborationNode::new(login))
}

fn count_state(reviews: &[ReviewRecord], state: ReviewState) -> usize {
    reviews.iter().filter(|r| r.state == state).count()
}

fn push_non_negative(values: &mut Vec<f64>, hours: f64, pr: &PullRequestRecord) {
    if hours < 0.0 {
        debug!(repo = %pr.repo_id, pr = pr.number, hours, "Negative duration discarded");
        return;
    }
    values.push(hours);
}
