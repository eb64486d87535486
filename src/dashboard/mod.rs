pub mod stats;

pub use stats::{compute_stats, DashboardStats, IssueCount, MetricAverage, StatsOptions};
