//! Commit collection from local git repositories.

pub mod commit;
pub mod repository;

pub use commit::{commit_record, DiffStats};
pub use repository::{repo_id_from_url, GitRepository};

