//! Per-category commit counts.

use serde::{Deserialize, Serialize};

use crate::classify::Category;

/// Commit count for each category plus the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// Feature commits.
    pub feature: u64,
    /// Bugfix commits.
    pub bugfix: u64,
    /// Refactor commits.
    pub refactor: u64,
    /// Test commits.
    pub test: u64,
    /// Docs commits.
    pub docs: u64,
    /// Chore commits.
    pub chore: u64,
    /// Merge commits.
    pub merge: u64,
    /// Unclassified commits.
    pub other: u64,
    /// Sum of all categories.
    pub total: u64,
}

impl CategoryBreakdown {
    /// Counts one more commit of `category`.
    pub fn record(&mut self, category: Category) {
        *self.slot_mut(category) += 1;
        self.total += 1;
    }

    /// Returns the count for `category`.
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Feature => self.feature,
            Category::Bugfix => self.bugfix,
            Category::Refactor => self.refactor,
            Category::Test => self.test,
            Category::Docs => self.docs,
            Category::Chore => self.chore,
            Category::Merge => self.merge,
            Category::Other => self.other,
        }
    }

    fn slot_mut(&mut self, category: Category) -> &mut u64 {
        match category {
            Category::Feature => &mut self.feature,
            Category::Bugfix => &mut self.bugfix,
            Category::Refactor => &mut self.refactor,
            Category::Test => &mut self.test,
            Category::Docs => &mut self.docs,
            Category::Chore => &mut self.chore,
            Category::Merge => &mut self.merge,
            Category::Other => &mut self.other,
        }
    }

    /// Adds every count of `other` into `self`.
    pub fn merge_from(&mut self, other: &CategoryBreakdown) {
        for category in Category::ALL {
            *self.slot_mut(category) += other.get(category);
        }
        self.total += other.total;
    }
}

impl FromIterator<Category> for CategoryBreakdown {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut breakdown = CategoryBreakdown::default();
        for category in iter {
            breakdown.record(category);
        }
        breakdown
    }
}

/// Counts occurrences of each category in a single pass.
pub fn calculate_breakdown(categories: &[Category]) -> CategoryBreakdown {
    categories.iter().copied().collect()
}
