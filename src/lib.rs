//! Commit activity of student groups.
//!
//! Every folder under a root directory is a group holding one git working
//! copy. Commits of all branches are counted per unified author and per day
//! inside a half-open date window, then summarized into CSV tables and a
//! balance indicator per group.

pub mod aggregate;
pub mod alias;
pub mod analyze;
pub mod balance;
pub mod cache;
pub mod cli;
pub mod collect;
pub mod config;
pub mod error;
pub mod git;
pub mod model;
pub mod output;
pub mod report;
pub mod sync;
pub mod util;

pub use aggregate::{aggregate_repository, AggregationOptions, BranchCounting};
pub use alias::{AliasTable, ExcludedAuthors};
pub use balance::compute_balance;
pub use collect::{run, RunOptions};
pub use error::{GroupStatError, Result};
pub use model::{AnalysisWindow, AuthorStats, BalanceIndicator, DailyMetric, GroupDataset};
