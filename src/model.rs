use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub email: String,
    pub date: String,
}

/// Dual epoch timestamps plus their rendered forms in the configured
/// timezone mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timestamps {
    pub author: i64,
    pub commit: i64,
    pub author_local: String,
    pub commit_local: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub file: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletions: Option<i64>,
}

/// How to retrieve a commit's diff, independent of whether it is embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRef {
    pub embed: bool,
    pub git_show_cmd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_patch_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: i64,
    pub title: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<String>,
    pub html_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

/// One commit's normalized view. Constructed once, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub short_sha: String,
    pub parents: Vec<String>,
    pub author: Person,
    pub committer: Person,
    pub timestamps: Timestamps,
    pub subject: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_lines: Option<Vec<String>>,
    pub files: Vec<FileChange>,
    pub diffstat_text: String,
    pub patch_ref: PatchRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_clipped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_requests: Option<Vec<PullRequest>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeInfo {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFlags {
    pub include_merges: bool,
    pub include_patch: bool,
    pub mode: String,
    pub tz: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    pub additions: i64,
    pub deletions: i64,
    pub files_touched: usize,
}

/// Lightweight reference to a commit shard on disk (full mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestItem {
    pub sha: String,
    pub file: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchEntry {
    pub name: String,
    pub merged_into_head: Option<bool>,
    pub ahead_of_head: Option<i64>,
    pub behind_head: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commits: Option<Vec<CommitRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ManifestItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmergedSection {
    pub branches_scanned: usize,
    pub total_unmerged_commits: usize,
    pub branches: Vec<BranchEntry>,
}

/// Aggregate record for one window. In simple mode `commits` holds the
/// full records inline; in full mode `items` references shard files.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub label: String,
    pub range: RangeInfo,
    pub repo: String,
    pub flags: ReportFlags,
    pub count: usize,
    pub authors: BTreeMap<String, i64>,
    pub changeset: ChangeSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commits: Option<Vec<CommitRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ManifestItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmerged_activity: Option<UnmergedSection>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BucketRef {
    pub label: String,
    pub range: RangeInfo,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Index over all windows of a multi-window run, written once at the
/// top of the output directory.
#[derive(Debug, Serialize, Deserialize)]
pub struct TopManifest {
    pub version: u32,
    pub repo: String,
    pub generated_at: String,
    pub mode: String,
    pub flags: ReportFlags,
    pub buckets: Vec<BucketRef>,
}
