use crate::error::{GactError, Result};
use crate::window::TimeRange;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Handle to a local repository. Discovery goes through gix so any
/// subdirectory of a work tree resolves to its root; range queries shell
/// out to `git` so opaque date expressions hit git's own parser.
pub struct GitRepo {
    path: PathBuf,
}

/// Parsed output of the NUL-separated pretty-format used by `metadata`.
pub struct CommitMeta {
    pub sha: String,
    pub parents: Vec<String>,
    pub author_name: String,
    pub author_email: String,
    pub author_date: String,
    pub committer_name: String,
    pub committer_email: String,
    pub committer_date: String,
    pub author_epoch: i64,
    pub commit_epoch: i64,
    pub subject: String,
    pub body: String,
}

pub struct NumStat {
    pub path: String,
    pub additions: Option<i64>,
    pub deletions: Option<i64>,
}

pub struct StatusEntry {
    pub status: String,
    pub file: String,
    pub old_path: Option<String>,
}

// fmt = %H %P %an %ae %ad %cN %cE %cD %at %ct %s %b, NUL-separated.
const META_FORMAT: &str = "%H%x00%P%x00%an%x00%ae%x00%ad%x00%cN%x00%cE%x00%cD%x00%at%x00%ct%x00%s%x00%b";

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or(std::env::current_dir()?);

        let repo = gix::discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, args: &[String]) -> Result<String> {
        let out = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
            .map_err(|e| GactError::Git(format!("spawning git {args:?}: {e}")))?;

        if out.status.success() {
            Ok(String::from_utf8_lossy(&out.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(GactError::Git(format!("git {args:?} failed: {}", stderr.trim())))
        }
    }

    /// Commit SHAs reachable from HEAD in the window, earliest first.
    pub fn list_commits(&self, range: &TimeRange, include_merges: bool) -> Result<Vec<String>> {
        let mut args: Vec<String> = vec![
            "-c".into(),
            "log.showSignature=false".into(),
            "rev-list".into(),
            format!("--since={}", range.since_arg()),
            format!("--until={}", range.until_arg()),
            "--date-order".into(),
            "--reverse".into(),
            "HEAD".into(),
        ];
        if !include_merges {
            args.insert(3, "--no-merges".into());
        }

        let out = self.run(&args)?;
        Ok(non_empty_lines(&out))
    }

    /// Full metadata for one commit via `git show --no-patch`.
    pub fn metadata(&self, sha: &str) -> Result<CommitMeta> {
        let args: Vec<String> = vec![
            "show".into(),
            "--no-patch".into(),
            "--date=iso-strict".into(),
            format!("--pretty=format:{META_FORMAT}"),
            sha.into(),
        ];
        let out = self.run(&args)?;

        let parts: Vec<&str> = out.split('\u{0}').collect();
        let get = |i: usize| -> String { parts.get(i).unwrap_or(&"").to_string() };

        let parents_raw = get(1);
        let parents = if parents_raw.is_empty() {
            Vec::new()
        } else {
            parents_raw.split_whitespace().map(String::from).collect()
        };

        Ok(CommitMeta {
            sha: get(0),
            parents,
            author_name: get(2),
            author_email: get(3),
            author_date: get(4),
            committer_name: get(5),
            committer_email: get(6),
            committer_date: get(7),
            author_epoch: get(8).parse().unwrap_or(0),
            commit_epoch: get(9).parse().unwrap_or(0),
            subject: get(10),
            body: get(11),
        })
    }

    /// Per-file additions/deletions. Binary files report `-` which parses
    /// to `None`.
    pub fn numstat(&self, sha: &str) -> Result<Vec<NumStat>> {
        let args: Vec<String> = vec![
            "show".into(),
            "--numstat".into(),
            "--format=".into(),
            "--no-color".into(),
            sha.into(),
        ];
        let out = self.run(&args)?;

        let mut files = Vec::new();
        for line in out.lines() {
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() != 3 {
                continue;
            }
            files.push(NumStat {
                path: parts[2].to_string(),
                additions: parts[0].parse().ok(),
                deletions: parts[1].parse().ok(),
            });
        }
        Ok(files)
    }

    /// Status-coded file list via `--name-status -z`; renames and copies
    /// carry the old path.
    pub fn name_status(&self, sha: &str) -> Result<Vec<StatusEntry>> {
        let args: Vec<String> = vec![
            "show".into(),
            "--name-status".into(),
            "-z".into(),
            "--format=".into(),
            "--no-color".into(),
            sha.into(),
        ];
        let out = self.run(&args)?;

        let parts: Vec<&str> = out.split('\u{0}').collect();
        let mut entries = Vec::new();
        let mut i = 0;

        while i < parts.len() && !parts[i].is_empty() {
            let status = parts[i].to_string();
            i += 1;

            if status.starts_with('R') || status.starts_with('C') {
                if i + 1 >= parts.len() {
                    break;
                }
                entries.push(StatusEntry {
                    status,
                    old_path: Some(parts[i].to_string()),
                    file: parts[i + 1].to_string(),
                });
                i += 2;
            } else {
                if i >= parts.len() {
                    break;
                }
                let file = parts[i].to_string();
                i += 1;
                if file.is_empty() {
                    continue;
                }
                entries.push(StatusEntry {
                    status,
                    old_path: None,
                    file,
                });
            }
        }
        Ok(entries)
    }

    /// Human-readable summary line from `--shortstat`.
    pub fn diffstat_line(&self, sha: &str) -> Result<String> {
        let args: Vec<String> = vec![
            "show".into(),
            "--shortstat".into(),
            "--format=".into(),
            "--no-color".into(),
            sha.into(),
        ];
        let out = self.run(&args)?;
        Ok(out.lines().last().unwrap_or("").trim().to_string())
    }

    /// Full unified diff text for one commit.
    pub fn patch_text(&self, sha: &str) -> Result<String> {
        let args: Vec<String> = vec![
            "show".into(),
            "--patch".into(),
            "--format=".into(),
            "--no-color".into(),
            sha.into(),
        ];
        self.run(&args)
    }

    /// Current branch short name, or `None` when HEAD is detached.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let out = self.run(&["rev-parse".into(), "--abbrev-ref".into(), "HEAD".into()])?;
        let name = out.trim();
        if name == "HEAD" {
            Ok(None)
        } else {
            Ok(Some(name.to_string()))
        }
    }

    pub fn local_branches(&self) -> Result<Vec<String>> {
        let out = self.run(&[
            "for-each-ref".into(),
            "refs/heads".into(),
            "--format=%(refname:short)".into(),
        ])?;
        Ok(non_empty_lines(&out))
    }

    /// Whether `branch` is an ancestor of HEAD. A failed query yields
    /// `None` rather than an error; the scan carries on.
    pub fn merged_into_head(&self, branch: &str) -> Option<bool> {
        let status = Command::new("git")
            .args(["merge-base", "--is-ancestor", branch, "HEAD"])
            .current_dir(&self.path)
            .status();
        match status {
            Ok(st) => Some(st.success()),
            Err(_) => None,
        }
    }

    /// `(ahead_of_head, behind_head)` for `branch`, or `None` when the
    /// counts cannot be determined.
    pub fn ahead_behind(&self, branch: &str) -> Option<(i64, i64)> {
        let out = self
            .run(&[
                "rev-list".into(),
                "--left-right".into(),
                "--count".into(),
                format!("HEAD...{branch}"),
            ])
            .ok()?;

        let parts: Vec<&str> = out.split_whitespace().collect();
        if parts.len() != 2 {
            return None;
        }
        // Left side counts commits only in HEAD, right side only in branch.
        let behind = parts[0].parse().ok()?;
        let ahead = parts[1].parse().ok()?;
        Some((ahead, behind))
    }

    /// Configured `remote.origin.url`, if any.
    pub fn origin_url(&self) -> Option<String> {
        self.run(&["config".into(), "--get".into(), "remote.origin.url".into()])
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Commits reachable from `branch` but not HEAD, filtered to the
    /// window, earliest first.
    pub fn unmerged_commits(
        &self,
        branch: &str,
        range: &TimeRange,
        include_merges: bool,
    ) -> Result<Vec<String>> {
        let mut args: Vec<String> = vec![
            "-c".into(),
            "log.showSignature=false".into(),
            "rev-list".into(),
            branch.into(),
            "^HEAD".into(),
            format!("--since={}", range.since_arg()),
            format!("--until={}", range.until_arg()),
            "--date-order".into(),
            "--reverse".into(),
        ];
        if !include_merges {
            args.insert(3, "--no-merges".into());
        }

        let out = self.run(&args)?;
        Ok(non_empty_lines(&out))
    }
}

fn non_empty_lines(out: &str) -> Vec<String> {
    out.lines()
        .map(|l| l.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
