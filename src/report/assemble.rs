use crate::cli::ExportConfig;
use crate::error::Result;
use crate::git::GitRepo;
use crate::model::{
    BranchEntry, CommitRecord, Manifest, ManifestItem, RangeInfo, ReportFlags, UnmergedSection,
    SCHEMA_VERSION,
};
use crate::report::accumulate::Accumulator;
use crate::report::record::{build_record, RecordOptions};
use crate::util::{format_shard_name, sanitize_branch};
use crate::window::TimeRange;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

pub fn report_flags(cfg: &ExportConfig) -> ReportFlags {
    ReportFlags {
        include_merges: cfg.include_merges,
        include_patch: cfg.include_patch,
        mode: if cfg.full { "full" } else { "simple" }.to_string(),
        tz: cfg.tz.as_str().to_string(),
    }
}

fn record_options(cfg: &ExportConfig) -> RecordOptions {
    RecordOptions {
        tz: cfg.tz,
        embed_patch: cfg.include_patch,
        max_patch_bytes: cfg.max_patch_bytes,
        patch_dir: cfg.save_patches.clone(),
        enrich_prs: cfg.github_prs,
    }
}

fn spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Exporting {label}..."));
    pb
}

/// Assemble one window. In simple mode (`base_dir` None) every record is
/// held inline; in full mode each record becomes its own shard file under
/// `<base>/<label>/` and the manifest keeps item references instead.
pub fn assemble_window(
    repo: &GitRepo,
    cfg: &ExportConfig,
    label: &str,
    range: &TimeRange,
    base_dir: Option<&Path>,
) -> Result<Manifest> {
    let shas = repo.list_commits(range, cfg.include_merges)?;
    let opts = record_options(cfg);

    let subdir = base_dir.map(|base| base.join(label));
    if let Some(dir) = &subdir {
        std::fs::create_dir_all(dir)?;
    }

    let pb = spinner(label);
    let mut acc = Accumulator::new();
    let mut commits: Vec<CommitRecord> = Vec::with_capacity(shas.len());
    let mut items: Vec<ManifestItem> = Vec::with_capacity(shas.len());

    for sha in &shas {
        let record = build_record(repo, sha, &opts)?;
        acc.accumulate(&record);

        if let Some(dir) = &subdir {
            let fname = write_shard(dir, &record, cfg)?;
            items.push(ManifestItem {
                sha: record.sha.clone(),
                file: format!("{label}/{fname}"),
                subject: record.subject.clone(),
            });
        } else {
            commits.push(record);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let unmerged_activity = if cfg.include_unmerged {
        let section = scan_unmerged(repo, cfg, range, label, subdir.as_deref())?;
        // Branches without qualifying commits contribute nothing at all.
        if section.branches.is_empty() {
            None
        } else {
            Some(section)
        }
    } else {
        None
    };

    let totals = acc.finalize();
    Ok(Manifest {
        version: SCHEMA_VERSION,
        label: label.to_string(),
        range: RangeInfo {
            start: range.since_arg(),
            end: range.until_arg(),
        },
        repo: repo.path().to_string_lossy().to_string(),
        flags: report_flags(cfg),
        count: totals.count,
        authors: totals.authors,
        changeset: totals.changeset,
        commits: if subdir.is_none() { Some(commits) } else { None },
        items: if subdir.is_some() { Some(items) } else { None },
        unmerged_activity,
    })
}

fn write_shard(subdir: &Path, record: &CommitRecord, cfg: &ExportConfig) -> Result<String> {
    let fname = format_shard_name(record.timestamps.commit, &record.short_sha, cfg.tz);
    std::fs::write(subdir.join(&fname), serde_json::to_vec(record)?)?;
    Ok(fname)
}

/// Scan every local branch other than the checked-out one for commits in
/// the window not reachable from HEAD. Branches with nothing to report
/// are skipped entirely but still count as scanned.
fn scan_unmerged(
    repo: &GitRepo,
    cfg: &ExportConfig,
    range: &TimeRange,
    label: &str,
    subdir: Option<&Path>,
) -> Result<UnmergedSection> {
    let current = repo.current_branch()?;
    let branches: Vec<String> = repo
        .local_branches()?
        .into_iter()
        .filter(|b| Some(b.as_str()) != current.as_deref())
        .collect();

    let opts = record_options(cfg);
    let mut section = UnmergedSection {
        branches_scanned: branches.len(),
        total_unmerged_commits: 0,
        branches: Vec::new(),
    };

    for branch in branches {
        let shas = repo.unmerged_commits(&branch, range, cfg.include_merges)?;
        if shas.is_empty() {
            continue;
        }

        let branch_dir_name = sanitize_branch(&branch);
        let branch_dir = subdir.map(|d| d.join("unmerged").join(&branch_dir_name));
        if let Some(dir) = &branch_dir {
            std::fs::create_dir_all(dir)?;
        }

        let mut commits: Vec<CommitRecord> = Vec::with_capacity(shas.len());
        let mut items: Vec<ManifestItem> = Vec::with_capacity(shas.len());

        for sha in &shas {
            let record = build_record(repo, sha, &opts)?;
            if let Some(dir) = &branch_dir {
                let fname = write_shard(dir, &record, cfg)?;
                items.push(ManifestItem {
                    sha: record.sha.clone(),
                    file: format!("{label}/unmerged/{branch_dir_name}/{fname}"),
                    subject: record.subject.clone(),
                });
            } else {
                commits.push(record);
            }
        }

        section.total_unmerged_commits += shas.len();

        let (ahead, behind) = match repo.ahead_behind(&branch) {
            Some((a, b)) => (Some(a), Some(b)),
            None => (None, None),
        };

        section.branches.push(BranchEntry {
            merged_into_head: repo.merged_into_head(&branch),
            ahead_of_head: ahead,
            behind_head: behind,
            commits: if branch_dir.is_none() { Some(commits) } else { None },
            items: if branch_dir.is_some() { Some(items) } else { None },
            name: branch,
        });
    }

    Ok(section)
}
