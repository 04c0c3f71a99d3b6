use crate::error::{GactError, Result};
use crate::git::{GitRepo, NumStat, StatusEntry};
use crate::github;
use crate::model::{CommitRecord, FileChange, PatchRef, Person, Timestamps};
use crate::util::{canonicalize_lossy, clip_patch, iso_in_tz, short_sha};
use crate::window::Tz;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Options threaded into every record build. Timezone mode rides along
/// so timestamp formatting stays a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub tz: Tz,
    pub embed_patch: bool,
    pub max_patch_bytes: usize,
    pub patch_dir: Option<PathBuf>,
    pub enrich_prs: bool,
}

/// Build one normalized commit record. Enrichment and patch handling are
/// best-effort; only a metadata-level git failure aborts the commit.
pub fn build_record(repo: &GitRepo, sha: &str, opts: &RecordOptions) -> Result<CommitRecord> {
    let fail = |reason: GactError| GactError::Commit {
        sha: short_sha(sha),
        reason: reason.to_string(),
    };

    let meta = repo.metadata(sha).map_err(fail)?;
    let numstat = repo.numstat(sha).map_err(fail)?;
    let status = repo.name_status(sha).map_err(fail)?;
    let diffstat_text = repo.diffstat_line(sha).map_err(fail)?;

    let files = build_file_changes(numstat, status);

    let timestamps = Timestamps {
        author: meta.author_epoch,
        commit: meta.commit_epoch,
        author_local: iso_in_tz(meta.author_epoch, opts.tz),
        commit_local: iso_in_tz(meta.commit_epoch, opts.tz),
        timezone: opts.tz.as_str().to_string(),
    };

    let body_lines = if meta.body.is_empty() {
        None
    } else {
        Some(meta.body.lines().map(String::from).collect())
    };

    let mut record = CommitRecord {
        short_sha: short_sha(&meta.sha),
        parents: meta.parents,
        author: Person {
            name: meta.author_name,
            email: meta.author_email,
            date: meta.author_date,
        },
        committer: Person {
            name: meta.committer_name,
            email: meta.committer_email,
            date: meta.committer_date,
        },
        timestamps,
        subject: meta.subject,
        body: meta.body,
        body_lines,
        files,
        diffstat_text,
        patch_ref: PatchRef {
            embed: opts.embed_patch,
            git_show_cmd: format!("git show --patch --format= --no-color {}", meta.sha),
            local_patch_file: None,
            diff_url: None,
            patch_url: None,
        },
        patch: None,
        patch_clipped: None,
        pull_requests: None,
        sha: meta.sha,
    };

    if opts.enrich_prs {
        let prs = github::find_pull_requests(repo, &record.sha);
        if let Some(first) = prs.first() {
            record.patch_ref.diff_url = first.diff_url.clone();
            record.patch_ref.patch_url = first.patch_url.clone();
        }
        if !prs.is_empty() {
            record.pull_requests = Some(prs);
        }
    }

    if opts.embed_patch {
        if let Ok(text) = repo.patch_text(&record.sha) {
            let (patch, clipped) = clip_patch(text, opts.max_patch_bytes);
            record.patch = Some(patch);
            record.patch_clipped = Some(clipped);
        }
    }

    if let Some(dir) = &opts.patch_dir {
        if let Err(err) = save_patch(repo, &mut record, dir) {
            eprintln!("gact: skipping patch file for {}: {err}", record.short_sha);
        }
    }

    Ok(record)
}

/// Reconcile numstat counts with the status-coded file list by path.
/// When the status list is missing, every numstat file counts as a
/// plain modification.
pub fn build_file_changes(numstat: Vec<NumStat>, status: Vec<StatusEntry>) -> Vec<FileChange> {
    if status.is_empty() {
        return numstat
            .into_iter()
            .map(|n| FileChange {
                file: n.path,
                status: "M".to_string(),
                old_path: None,
                additions: n.additions,
                deletions: n.deletions,
            })
            .collect();
    }

    let counts: HashMap<String, (Option<i64>, Option<i64>)> = numstat
        .into_iter()
        .map(|n| (n.path, (n.additions, n.deletions)))
        .collect();

    status
        .into_iter()
        .map(|entry| {
            let (additions, deletions) = counts.get(&entry.file).copied().unwrap_or((None, None));
            FileChange {
                file: entry.file,
                status: entry.status,
                old_path: entry.old_path,
                additions,
                deletions,
            }
        })
        .collect()
}

fn save_patch(repo: &GitRepo, record: &mut CommitRecord, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.patch", record.short_sha));
    let content = repo.patch_text(&record.sha)?;
    std::fs::write(&path, content)?;
    record.patch_ref.local_patch_file = Some(canonicalize_lossy(&path));
    Ok(())
}
