//! # devpulse
//!
//! Commit and review analytics for engineering teams.
//!
//! ## Features
//!
//! - Rule-based commit classification from messages and changed paths
//! - Weekly velocity with a snapshot cache and week-over-week trends
//! - Team benchmarks and reviewer/author collaboration graphs
//!
//! ## Quick Start
//!
//! ```rust
//! use devpulse::classify::{categorize_commit, Category};
//!
//! let result = categorize_commit("fix(api): handle empty body", None, false);
//! assert_eq!(result.category, Category::Bugfix);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod analytics;
pub mod classify;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod git;
pub mod identity;
pub mod store;
pub mod sync;

pub use crate::cli::Cli;

/// The current version of devpulse.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
