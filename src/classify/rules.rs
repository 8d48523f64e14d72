//! Ordered rule tables for the commit classifier.
//!
//! Evaluation order matters in every table: the first matching rule wins.

use std::sync::LazyLock;

use regex::Regex;

use super::Category;

/// Confidence assigned to a recognised conventional-commit prefix.
pub const PREFIX_CONFIDENCE: f64 = 0.95;

/// Confidence assigned to a recognised `[type]` bracket prefix.
pub const BRACKET_CONFIDENCE: f64 = 0.90;

/// Confidence assigned to merge commits, by flag or by message.
pub const MERGE_CONFIDENCE: f64 = 0.95;

/// Confidence of the fallback `other` result.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Prefix token to category lookup, shared by the conventional and bracket forms.
pub const PREFIX_TABLE: &[(&str, Category)] = &[
    ("feat", Category::Feature),
    ("feature", Category::Feature),
    ("fix", Category::Bugfix),
    ("bugfix", Category::Bugfix),
    ("hotfix", Category::Bugfix),
    ("refactor", Category::Refactor),
    ("test", Category::Test),
    ("tests", Category::Test),
    ("docs", Category::Docs),
    ("doc", Category::Docs),
    ("chore", Category::Chore),
    ("build", Category::Chore),
    ("ci", Category::Chore),
    ("deps", Category::Chore),
    ("style", Category::Chore),
    ("lint", Category::Chore),
    ("perf", Category::Chore),
    ("wip", Category::Other),
    ("revert", Category::Other),
];

/// Looks up a lower-cased prefix token.
pub fn lookup_prefix(token: &str) -> Option<Category> {
    PREFIX_TABLE
        .iter()
        .find(|(prefix, _)| *prefix == token)
        .map(|(_, category)| *category)
}

/// `type(scope)!: ` conventional form.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
pub static CONVENTIONAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)(?:\([^)]*\))?!?:\s").unwrap());

/// Bare `type ` form, e.g. `fix typo in header`.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
pub static BARE_PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)\s").unwrap());

/// `[type]` bracket form.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
pub static BRACKET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([a-z]+)\]").unwrap());

/// A pattern bound to a category and a fixed confidence.
pub struct Rule {
    /// Compiled pattern.
    pub pattern: Regex,
    /// Category assigned on match.
    pub category: Category,
    /// Confidence assigned on match.
    pub confidence: f64,
    /// Short label used in diagnostic reasons.
    pub label: &'static str,
}

#[allow(clippy::unwrap_used)] // Compile-time constant regex patterns
fn compile(rules: &[(&'static str, &str, Category, f64)]) -> Vec<Rule> {
    rules
        .iter()
        .map(|(label, pattern, category, confidence)| Rule {
            pattern: Regex::new(pattern).unwrap(),
            category: *category,
            confidence: *confidence,
            label: *label,
        })
        .collect()
}

/// Keyword rules scanned against the raw message, case-insensitively.
pub static KEYWORD_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    compile(&[
        (
            "bugfix keyword",
            r"(?i)\b(fix(es|ed|ing)?|bugs?|hotfix|resolved?|resolves|crash(es|ed)?|broken|regression)\b",
            Category::Bugfix,
            0.8,
        ),
        (
            "test keyword",
            r"(?i)\b(tests?|testing|specs?|coverage)\b",
            Category::Test,
            0.7,
        ),
        (
            "docs keyword",
            r"(?i)\b(docs?|documentation|readme|changelog)\b",
            Category::Docs,
            0.7,
        ),
        (
            "refactor keyword",
            r"(?i)\b(refactor(s|ed|ing)?|clean ?up|restructur(e|ed|es|ing)|reorganiz(e|ed|es|ing)|simplif(y|ied|ies)|renamed?|extract(ed|s)?)\b",
            Category::Refactor,
            0.6,
        ),
        (
            "feature keyword",
            r"(?i)\b(add(s|ed|ing)?|implement(s|ed|ing)?|introduc(e|ed|es|ing)|creates?|created|support)\b",
            Category::Feature,
            0.7,
        ),
        (
            "chore keyword",
            r"(?i)\b(bump(s|ed)?|upgrade[sd]?|dependenc(y|ies)|deps|release|config(uration)?|lint)\b",
            Category::Chore,
            0.5,
        ),
    ])
});

/// Path rules applied to each changed file.
pub static FILE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    compile(&[
        (
            "test directory",
            r"(^|/)(tests?|__tests__|specs?)/",
            Category::Test,
            0.9,
        ),
        (
            "test file",
            r"\.(test|spec)\.[A-Za-z0-9]+$",
            Category::Test,
            0.9,
        ),
        (
            "test file",
            r"(_test\.(go|rs|py)|(^|/)test_[^/]+\.py)$",
            Category::Test,
            0.85,
        ),
        ("docs directory", r"(^|/)docs?/", Category::Docs, 0.85),
        (
            "project document",
            r"(?i)(^|/)(readme|changelog|contributing|license)[^/]*$",
            Category::Docs,
            0.85,
        ),
        (
            "docs file",
            r"\.(md|mdx|rst|adoc)$",
            Category::Docs,
            0.8,
        ),
        (
            "ci config",
            r"(^|/)(\.github/|\.circleci/|\.gitlab-ci\.yml$|\.travis\.yml$|azure-pipelines\.yml$)",
            Category::Chore,
            0.85,
        ),
        (
            "tooling config",
            r"(^|/)(\.eslintrc[^/]*|\.prettierrc[^/]*|tsconfig[^/]*\.json|\.editorconfig|\.gitignore|\.npmrc|\.nvmrc|Dockerfile|docker-compose[^/]*\.ya?ml|Makefile|rustfmt\.toml|clippy\.toml|deny\.toml|(babel|webpack|vite|jest|vitest|rollup)\.config\.[a-z]+)$",
            Category::Chore,
            0.75,
        ),
        (
            "lockfile",
            r"(^|/)(package-lock\.json|yarn\.lock|pnpm-lock\.yaml|Cargo\.lock|Gemfile\.lock|poetry\.lock|go\.sum|composer\.lock)$",
            Category::Chore,
            0.7,
        ),
    ])
});
