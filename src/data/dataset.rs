//! Code-host export of pull requests and reviews.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{PullRequestRecord, ReviewRecord};

/// Pull requests and reviews exported from the code host.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDataset {
    /// Pull request rows.
    #[serde(default)]
    pub pull_requests: Vec<PullRequestRecord>,
    /// Review rows.
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
}

impl ReviewDataset {
    /// Loads a dataset from a `.json` file, or YAML for any other extension.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read review dataset: {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let dataset: ReviewDataset = if is_json {
            serde_json::from_str(&content).context("Failed to parse JSON review dataset")?
        } else {
            crate::data::from_yaml(&content).context("Failed to parse YAML review dataset")?
        };

        dataset.validate()?;

        Ok(dataset)
    }

    /// Validates row identity and required fields.
    pub fn validate(&self) -> Result<()> {
        let mut seen_prs = HashSet::new();
        for (i, pr) in self.pull_requests.iter().enumerate() {
            if pr.repo_id.trim().is_empty() {
                anyhow::bail!("Pull request at index {i} has an empty repoId");
            }
            if pr.author_login.trim().is_empty() {
                anyhow::bail!("Pull request #{} has an empty authorLogin", pr.number);
            }
            if !seen_prs.insert((pr.repo_id.as_str(), pr.number)) {
                anyhow::bail!("Duplicate pull request {}#{}", pr.repo_id, pr.number);
            }
        }

        let mut seen_reviews = HashSet::new();
        for review in &self.reviews {
            if review.reviewer_login.trim().is_empty() {
                anyhow::bail!("Review {} has an empty reviewerLogin", review.id);
            }
            if !seen_reviews.insert((review.repo_id.as_str(), review.pr_number, review.id)) {
                anyhow::bail!(
                    "Duplicate review {} on {}#{}",
                    review.id,
                    review.repo_id,
                    review.pr_number
                );
            }
        }

        Ok(())
    }
}
