//! Git repository access for commit collection.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use git2::{ErrorCode, Repository, Sort};
use tracing::debug;

use super::commit::commit_record;
use crate::data::CommitRecord;

/// Git repository wrapper
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Open repository at specified path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::open(path).context("Failed to open git repository")?;

        Ok(Self { repo })
    }

    /// Get workdir path
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Repository id for stored rows: `owner/name` from the origin remote,
    /// else the working directory's name.
    pub fn default_repo_id(&self) -> String {
        let from_remote = self
            .repo
            .find_remote("origin")
            .ok()
            .and_then(|remote| remote.url().and_then(repo_id_from_url));

        from_remote
            .or_else(|| {
                self.workdir()
                    .and_then(|dir| dir.file_name())
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "local".to_string())
    }

    /// Walks history from HEAD, newest first, keeping commits authored at or
    /// after `since`. An unborn HEAD yields no commits.
    pub fn collect_commits(
        &self,
        repo_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitRecord>> {
        match self.repo.head() {
            Ok(_) => {}
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(Vec::new()),
            Err(e) => return Err(e).context("Failed to get HEAD reference"),
        }

        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker
            .set_sorting(Sort::TIME)
            .context("Failed to set revwalk order")?;
        walker.push_head().context("Failed to push HEAD")?;

        let mut commits = Vec::new();
        for oid in walker {
            let oid = oid.context("Failed to get commit OID from walker")?;
            let commit = self
                .repo
                .find_commit(oid)
                .context("Failed to find commit")?;

            let authored = commit.author().when().seconds();
            if since.is_some_and(|since| authored < since.timestamp()) {
                continue;
            }
            commits.push(commit_record(&self.repo, &commit, repo_id)?);
        }

        debug!(repo = repo_id, count = commits.len(), "Collected commits");
        Ok(commits)
    }
}

/// Extracts `owner/name` from an SSH or HTTPS remote URL.
pub fn repo_id_from_url(url: &str) -> Option<String> {
    let path = if let Some((_, rest)) = url.split_once("://") {
        rest.split_once('/').map(|(_, path)| path)?
    } else {
        url.split_once(':').map(|(_, path)| path)?
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut parts = path.rsplit('/');
    let name = parts.next().filter(|s| !s.is_empty())?;
    let owner = parts.next().filter(|s| !s.is_empty())?;
    Some(format!("{owner}/{name}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use git2::{Signature, Time};

    fn commit_at(repo: &Repository, file: &str, at: DateTime<Utc>) {
        std::fs::write(repo.workdir().unwrap().join(file), file).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

        let parent = repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let signature = Signature::new("Dev", "dev@example.com", &Time::new(at.timestamp(), 0)).unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, file, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn parses_ssh_remote() {
        assert_eq!(
            repo_id_from_url("git@github.com:acme/api.git").as_deref(),
            Some("acme/api")
        );
    }

    #[test]
    fn parses_https_remote() {
        assert_eq!(
            repo_id_from_url("https://github.com/acme/api.git").as_deref(),
            Some("acme/api")
        );
        assert_eq!(
            repo_id_from_url("https://gitlab.example.com/group/sub/web").as_deref(),
            Some("sub/web")
        );
    }

    #[test]
    fn rejects_bare_names() {
        assert_eq!(repo_id_from_url("api"), None);
        assert_eq!(repo_id_from_url("https://github.com/"), None);
    }

    #[test]
    fn unborn_repository_has_no_commits() {
        let dir = tempfile::TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        let repo = GitRepository::open_at(dir.path()).unwrap();
        assert!(repo.collect_commits("acme/api", None).unwrap().is_empty());
    }

    #[test]
    fn since_keeps_commits_at_or_after_cutoff() {
        let dir = tempfile::TempDir::new().unwrap();
        let raw = Repository::init(dir.path()).unwrap();
        let day = |d| Utc.with_ymd_and_hms(2026, 3, d, 9, 0, 0).unwrap();
        commit_at(&raw, "old.txt", day(1));
        commit_at(&raw, "edge.txt", day(5));
        commit_at(&raw, "new.txt", day(9));

        let repo = GitRepository::open_at(dir.path()).unwrap();
        let rows = repo.collect_commits("acme/api", Some(day(5))).unwrap();
        let messages: Vec<&str> = rows.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["new.txt", "edge.txt"]);
        assert_eq!(repo.collect_commits("acme/api", None).unwrap().len(), 3);
    }
}
