pub mod diff;
pub mod repo;

pub use repo::{BranchRef, CommitHeader, GroupRepo, LogEntry};
