pub mod repo;

pub use repo::{CommitMeta, GitRepo, NumStat, StatusEntry};
