//! Analytics over stored commits, pull requests and reviews.

pub mod benchmark;
pub mod breakdown;
pub mod collaboration;
pub mod stats;
pub mod velocity;

pub use benchmark::{team_benchmarks, team_benchmarks_at, TeamBenchmarks};
pub use breakdown::{calculate_breakdown, CategoryBreakdown};
pub use collaboration::{
    CollaborationAnalyzer, CollaborationGraph, EnhancedReviewMetrics,
};
pub use velocity::{Trend, VelocityEngine, VelocityMetrics};
