//! Rule-based commit classification.
//!
//! A commit is assigned one [`Category`] from its message and, when the
//! message alone is not conclusive, from the paths it touches. The engine is
//! deterministic and never fails: unclassifiable input degrades to
//! [`Category::Other`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod rules;

use rules::{
    BARE_PREFIX_PATTERN, BRACKET_CONFIDENCE, BRACKET_PATTERN, CONVENTIONAL_PATTERN,
    FALLBACK_CONFIDENCE, FILE_RULES, KEYWORD_RULES, MERGE_CONFIDENCE, PREFIX_CONFIDENCE,
};

/// Message confidence at or above which file evidence is not consulted.
const TRUSTED_MESSAGE_CONFIDENCE: f64 = 0.85;

/// Minimum share of files a category must cover to count as a file signal.
const FILE_COVERAGE_THRESHOLD: f64 = 0.5;

/// Minimum file confidence for corroboration.
const CORROBORATING_FILE_CONFIDENCE: f64 = 0.7;

/// Minimum message confidence for corroboration.
const CORROBORATING_MESSAGE_CONFIDENCE: f64 = 0.6;

/// Bonus added to the averaged confidence when both signals corroborate.
const CORROBORATION_BONUS: f64 = 0.1;

/// Work-type label assigned to a commit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// New functionality.
    Feature,
    /// Defect fix.
    Bugfix,
    /// Behaviour-preserving restructuring.
    Refactor,
    /// Test additions or changes.
    Test,
    /// Documentation.
    Docs,
    /// Tooling, dependencies, CI and other maintenance.
    Chore,
    /// Merge commit.
    Merge,
    /// Anything unclassifiable.
    #[default]
    Other,
}

impl Category {
    /// Every category, in canonical order.
    pub const ALL: [Category; 8] = [
        Category::Feature,
        Category::Bugfix,
        Category::Refactor,
        Category::Test,
        Category::Docs,
        Category::Chore,
        Category::Merge,
        Category::Other,
    ];

    /// Returns the lower-case label used in storage and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Feature => "feature",
            Category::Bugfix => "bugfix",
            Category::Refactor => "refactor",
            Category::Test => "test",
            Category::Docs => "docs",
            Category::Chore => "chore",
            Category::Merge => "merge",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// Outcome of classifying one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    /// Assigned category.
    pub category: Category,
    /// Heuristic certainty in `0.0..=1.0`.
    pub confidence: f64,
    /// Diagnostic explanation of the rule(s) that fired.
    pub reason: String,
}

impl CategoryResult {
    fn new(category: Category, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            category,
            confidence,
            reason: reason.into(),
        }
    }
}

/// Classifies a commit from its message, optional changed paths and merge flag.
///
/// The merge flag is authoritative. A high-confidence message result is
/// trusted outright; otherwise file evidence may replace the message result
/// when it is more confident, or corroborate it with a boosted confidence.
pub fn categorize_commit(message: &str, files: Option<&[String]>, is_merge: bool) -> CategoryResult {
    if is_merge {
        return CategoryResult::new(Category::Merge, MERGE_CONFIDENCE, "merge commit");
    }

    let by_message = categorize_by_message(message);
    if by_message.confidence >= TRUSTED_MESSAGE_CONFIDENCE {
        return by_message;
    }

    let by_files = match files {
        Some(files) if !files.is_empty() => categorize_by_files(files),
        _ => None,
    };

    let Some(by_files) = by_files else {
        return by_message;
    };

    if by_files.confidence > by_message.confidence {
        debug!(
            message_category = %by_message.category,
            file_category = %by_files.category,
            "File evidence overrides message"
        );
        return by_files;
    }

    if by_files.confidence >= CORROBORATING_FILE_CONFIDENCE
        && by_message.confidence >= CORROBORATING_MESSAGE_CONFIDENCE
    {
        let combined = ((by_message.confidence + by_files.confidence) / 2.0 + CORROBORATION_BONUS)
            .min(PREFIX_CONFIDENCE);
        return CategoryResult::new(
            by_message.category,
            combined,
            format!("{}; {}", by_message.reason, by_files.reason),
        );
    }

    by_message
}

/// Classifies a commit from its message alone.
pub fn categorize_by_message(message: &str) -> CategoryResult {
    let normalized = message.trim().to_lowercase();

    if normalized.starts_with("merge") {
        return CategoryResult::new(Category::Merge, MERGE_CONFIDENCE, "merge message");
    }

    let prefix = CONVENTIONAL_PATTERN
        .captures(&normalized)
        .or_else(|| BARE_PREFIX_PATTERN.captures(&normalized))
        .and_then(|caps| {
            let token = caps.get(1)?.as_str();
            rules::lookup_prefix(token).map(|category| (token.to_string(), category))
        });
    if let Some((token, category)) = prefix {
        return CategoryResult::new(
            category,
            PREFIX_CONFIDENCE,
            format!("conventional prefix '{token}'"),
        );
    }

    let bracket = BRACKET_PATTERN.captures(&normalized).and_then(|caps| {
        let token = caps.get(1)?.as_str();
        rules::lookup_prefix(token).map(|category| (token.to_string(), category))
    });
    if let Some((token, category)) = bracket {
        return CategoryResult::new(
            category,
            BRACKET_CONFIDENCE,
            format!("bracket prefix '[{token}]'"),
        );
    }

    if let Some(rule) = KEYWORD_RULES.iter().find(|r| r.pattern.is_match(message)) {
        return CategoryResult::new(rule.category, rule.confidence, rule.label);
    }

    debug!("No message signal, falling back to other");
    CategoryResult::new(Category::Other, FALLBACK_CONFIDENCE, "no recognizable signal")
}

/// Classifies a commit from its changed paths.
///
/// Each path counts toward the category of the first rule it matches. The
/// category with the most matches wins (the first one seen breaks ties) and is
/// returned only when it covers at least half of the paths.
pub fn categorize_by_files(files: &[String]) -> Option<CategoryResult> {
    if files.is_empty() {
        return None;
    }

    // (category, matches, max confidence) in first-seen order
    let mut tally: Vec<(Category, usize, f64)> = Vec::new();
    let mut labels: HashMap<Category, &'static str> = HashMap::new();

    for file in files {
        let Some(rule) = FILE_RULES.iter().find(|r| r.pattern.is_match(file)) else {
            continue;
        };
        match tally.iter_mut().find(|(c, _, _)| *c == rule.category) {
            Some(entry) => {
                entry.1 += 1;
                if rule.confidence > entry.2 {
                    entry.2 = rule.confidence;
                    labels.insert(rule.category, rule.label);
                }
            }
            None => {
                tally.push((rule.category, 1, rule.confidence));
                labels.insert(rule.category, rule.label);
            }
        }
    }

    let mut best: Option<(Category, usize, f64)> = None;
    for entry in &tally {
        if best.map_or(true, |(_, count, _)| entry.1 > count) {
            best = Some(*entry);
        }
    }
    let (category, count, confidence) = best?;

    if (count as f64) / (files.len() as f64) < FILE_COVERAGE_THRESHOLD {
        return None;
    }

    let label = labels.get(&category).copied().unwrap_or("path rule");
    Some(CategoryResult::new(
        category,
        confidence,
        format!("{count}/{} files match {label}", files.len()),
    ))
}
