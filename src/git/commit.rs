//! Conversion of git commits into commit rows.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use git2::{Commit, Diff, Repository};

use crate::classify::Category;
use crate::data::CommitRecord;

/// Line and file statistics of one commit against its first parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
    /// Files touched, as counted by git.
    pub files_changed: u64,
    /// Changed paths, new side preferred. Non-UTF-8 bytes are replaced.
    pub files: Vec<String>,
}

impl DiffStats {
    /// Diffs `commit` against its first parent, or the empty tree for a root commit.
    pub fn of_commit(repo: &Repository, commit: &Commit) -> Result<Self> {
        let commit_tree = commit.tree().context("Failed to get commit tree")?;

        let parent_tree = if commit.parent_count() > 0 {
            Some(
                commit
                    .parent(0)
                    .context("Failed to get parent commit")?
                    .tree()
                    .context("Failed to get parent tree")?,
            )
        } else {
            None
        };

        let diff = repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)
            .context("Failed to create diff")?;

        Self::from_diff(&diff)
    }

    fn from_diff(diff: &Diff) -> Result<Self> {
        let stats = diff.stats().context("Failed to compute diff stats")?;

        let files = diff
            .deltas()
            .filter_map(|delta| {
                delta
                    .new_file()
                    .path_bytes()
                    .or_else(|| delta.old_file().path_bytes())
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            })
            .collect();

        Ok(Self {
            additions: stats.insertions() as u64,
            deletions: stats.deletions() as u64,
            files_changed: stats.files_changed() as u64,
            files,
        })
    }
}

/// Builds an unclassified commit row; the category is set on ingest.
pub fn commit_record(repo: &Repository, commit: &Commit, repo_id: &str) -> Result<CommitRecord> {
    let author = commit.author();
    let when = author.when();
    let timestamp = DateTime::<Utc>::from_timestamp(when.seconds(), 0)
        .with_context(|| format!("Invalid timestamp on commit {}", commit.id()))?;

    let stats = DiffStats::of_commit(repo, commit)
        .with_context(|| format!("Failed to diff commit {}", commit.id()))?;

    Ok(CommitRecord {
        hash: commit.id().to_string(),
        repo_id: repo_id.to_string(),
        author_email: String::from_utf8_lossy(author.email_bytes()).to_lowercase(),
        author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
        timestamp,
        message: String::from_utf8_lossy(commit.message_bytes())
            .trim_end()
            .to_string(),
        is_merge: commit.parent_count() > 1,
        additions: stats.additions,
        deletions: stats.deletions,
        files_changed: stats.files_changed,
        files: Some(stats.files),
        category: Category::default(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use git2::{Signature, Time};
    use tempfile::TempDir;

    fn commit_file(repo: &Repository, relative: &Path, content: &str, message: &str) -> git2::Oid {
        let workdir = repo.workdir().unwrap();
        fs::write(workdir.join(relative), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(relative).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

        let signature = Signature::new("Dev", "dev@example.com", &Time::new(1_772_445_600, 0)).unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &[])
            .unwrap()
    }

    // ── diff stats ─────────────────────────────────────────────────

    #[test]
    fn root_commit_counts_added_lines_and_paths() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let oid = commit_file(&repo, Path::new("notes.md"), "one\ntwo\n", "docs: notes");

        let commit = repo.find_commit(oid).unwrap();
        let record = commit_record(&repo, &commit, "acme/api").unwrap();
        assert_eq!(record.additions, 2);
        assert_eq!(record.files_changed, 1);
        assert_eq!(record.files, Some(vec!["notes.md".to_string()]));
        assert_eq!(record.message, "docs: notes");
        assert!(!record.is_merge);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_are_kept_and_counted() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let name = Path::new(OsStr::from_bytes(b"caf\xe9.txt"));
        let oid = commit_file(&repo, name, "x\n", "add cafe file");

        let commit = repo.find_commit(oid).unwrap();
        let record = commit_record(&repo, &commit, "acme/api").unwrap();
        assert_eq!(record.additions, 1);
        assert_eq!(record.files_changed, 1);
        let files = record.files.unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("caf"));
        assert!(files[0].ends_with(".txt"));
    }

    #[test]
    fn non_utf8_message_is_decoded_lossily() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let base = commit_file(&repo, Path::new("a.rs"), "x\n", "init");
        let tree = repo.find_commit(base).unwrap().tree_id();

        let mut raw = format!(
            "tree {tree}\nauthor Dev <dev@example.com> 1772445600 +0000\n\
             committer Dev <dev@example.com> 1772445600 +0000\n\n"
        )
        .into_bytes();
        raw.extend_from_slice(b"fix: caf\xe9 crash\n");
        let oid = repo.odb().unwrap().write(git2::ObjectType::Commit, &raw).unwrap();

        let commit = repo.find_commit(oid).unwrap();
        let record = commit_record(&repo, &commit, "acme/api").unwrap();
        assert!(record.message.starts_with("fix: caf"));
        assert!(record.message.ends_with(" crash"));
        assert_eq!(crate::classify::categorize_commit(&record.message, None, false).category, Category::Bugfix);
    }
}
